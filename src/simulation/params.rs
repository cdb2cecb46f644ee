//! Numerical and physical parameters for the simulation
//!
//! `FieldParameters` holds the per-run settings shared by every particle:
//! - field strengths `E`, `B` and particle mass/charge,
//! - fixed integration step `dt` and the chosen `Method`,
//! - filter geometry (bore radius `R`, length `L`),
//! - derived cyclotron frequency `omega` and bounded horizon `t_end`
//!
//! Construction validates everything so a bad configuration never reaches a run.

use std::error::Error;
use std::f64::consts::TAU;
use std::fmt;

use crate::configuration::config::{Method, ParametersConfig};

/// Rejected configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositive { name: &'static str, value: f64 },
    Zero { name: &'static str },
    NonFinite { name: &'static str },
    UnknownMethod(String),
    InvalidVelocityBand { v_min: f64, v_max: f64 },
    ZeroParticles,
    ZeroBins,
    ZeroStepCap,
    EmptySweep,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::NonPositive { name, value } => {
                write!(f, "`{name}` must be strictly positive, got {value}")
            }
            ConfigError::Zero { name } => write!(f, "`{name}` must be nonzero"),
            ConfigError::NonFinite { name } => write!(f, "`{name}` must be finite"),
            ConfigError::UnknownMethod(m) => write!(f, "unknown integration method `{m}`"),
            ConfigError::InvalidVelocityBand { v_min, v_max } => {
                write!(f, "velocity band [{v_min}, {v_max}] is empty or not finite")
            }
            ConfigError::ZeroParticles => f.write_str("particle count must be at least 1"),
            ConfigError::ZeroBins => f.write_str("histogram needs at least one bin"),
            ConfigError::ZeroStepCap => f.write_str("unbounded mode needs a step cap of at least 1"),
            ConfigError::EmptySweep => f.write_str("convergence sweep needs at least one method and one dt"),
        }
    }
}

impl Error for ConfigError {}

fn finite(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { name })
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if finite(name, value)? > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn nonzero(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if finite(name, value)? != 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Zero { name })
    }
}

/// Immutable per-run configuration, shared read-only by all particles
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParameters {
    e_field: f64, // electric field E
    b_field: f64, // magnetic field B
    mass: f64,    // particle mass m
    charge: f64,  // particle charge q
    dt: f64,      // fixed step size
    radius: f64,  // filter bore radius R
    length: f64,  // filter length L
    method: Method,
    periods: f64, // cyclotron periods in the bounded horizon
    omega: f64,   // cyclotron frequency qB/m
    t_end: f64,   // bounded horizon periods * 2π / |omega|
}

impl FieldParameters {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        e_field: f64,
        b_field: f64,
        mass: f64,
        charge: f64,
        dt: f64,
        radius: f64,
        length: f64,
        method: Method,
    ) -> Result<Self, ConfigError> {
        let e_field = finite("E", e_field)?;
        let b_field = nonzero("B", b_field)?;
        let mass = positive("m", mass)?;
        // q = 0 gives omega = 0 and an infinite horizon
        let charge = nonzero("q", charge)?;
        let dt = positive("dt", dt)?;
        let radius = positive("R", radius)?;
        // random launches sample y from [-R, R], whose width must stay finite
        if !(2.0 * radius).is_finite() {
            return Err(ConfigError::NonFinite { name: "2R" });
        }
        let length = positive("L", length)?;

        let omega = charge * b_field / mass;
        let mut params = Self {
            e_field,
            b_field,
            mass,
            charge,
            dt,
            radius,
            length,
            method,
            periods: 1.0,
            omega,
            t_end: 0.0,
        };
        params.t_end = params.horizon();
        Ok(params)
    }

    /// Build from the YAML-facing config, including `periods`
    pub fn from_config(cfg: &ParametersConfig) -> Result<Self, ConfigError> {
        Self::new(
            cfg.e_field,
            cfg.b_field,
            cfg.mass,
            cfg.charge,
            cfg.dt,
            cfg.radius,
            cfg.length,
            cfg.method,
        )?
        .with_periods(cfg.periods)
    }

    /// Scale the bounded horizon to `periods` cyclotron periods
    pub fn with_periods(mut self, periods: f64) -> Result<Self, ConfigError> {
        self.periods = positive("periods", periods)?;
        self.t_end = self.horizon();
        Ok(self)
    }

    /// Same configuration with a different integrator
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Same configuration with a different step size
    pub fn with_dt(mut self, dt: f64) -> Result<Self, ConfigError> {
        self.dt = positive("dt", dt)?;
        Ok(self)
    }

    fn horizon(&self) -> f64 {
        self.periods * TAU / self.omega.abs()
    }

    pub fn e_field(&self) -> f64 { self.e_field }
    pub fn b_field(&self) -> f64 { self.b_field }
    pub fn mass(&self) -> f64 { self.mass }
    pub fn charge(&self) -> f64 { self.charge }
    pub fn dt(&self) -> f64 { self.dt }
    pub fn radius(&self) -> f64 { self.radius }
    pub fn length(&self) -> f64 { self.length }
    pub fn method(&self) -> Method { self.method }
    pub fn periods(&self) -> f64 { self.periods }
    pub fn omega(&self) -> f64 { self.omega }
    pub fn t_end(&self) -> f64 { self.t_end }

    /// E×B drift speed E/B
    pub fn drift_velocity(&self) -> f64 {
        self.e_field / self.b_field
    }
}
