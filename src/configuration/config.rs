//! Configuration types for loading experiments from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`ParametersConfig`]  – field strengths, particle, timestep, filter geometry, method
//! - [`ConvergenceConfig`] – optional single-particle sweep against the analytic solution
//! - [`FilterConfig`]      – optional Monte-Carlo velocity filter study
//! - [`ScenarioConfig`]    – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario matching these types:
//!
//! ```yaml
//! parameters:
//!   e_field: 1.0          # electric field magnitude
//!   b_field: 1.0          # magnetic field magnitude, nonzero
//!   mass: 1.0
//!   charge: 1.0
//!   dt: 0.01              # fixed step size
//!   radius: 0.003         # filter bore radius R
//!   length: 1.0           # filter length L
//!   periods: 1            # horizon in cyclotron periods (bounded mode)
//!   method: "rk4"         # euler | midpoint | rk4 | analytic
//!
//! convergence:
//!   methods: ["euler", "midpoint", "rk4"]
//!   dts: [0.01, 0.005, 0.0025]
//!
//! filter:
//!   n_particles: 10000
//!   seed: 42
//!   v_min: 0.9
//!   v_max: 1.1
//!   max_steps: 1000000
//!   bins: 20
//!
//! output_dir: "out"
//! ```
//!
//! The scenario builder validates this and maps it into the runtime types.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::simulation::params::ConfigError;

/// Which integrator advances the particles
/// `method: "euler"`, `"midpoint"`, `"rk4"` or `"analytic"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    #[serde(rename = "euler", alias = "taylor")] // Explicit first order Taylor step
    Euler,

    #[serde(rename = "midpoint")] // Explicit midpoint, second order
    Midpoint,

    #[serde(rename = "rk4", alias = "runge_kutta")] // Classical 4th-order Runge–Kutta
    RungeKutta4,

    #[serde(rename = "analytic")] // Closed-form reference solution, evaluated at absolute time
    Analytic,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Euler, Method::Midpoint, Method::RungeKutta4, Method::Analytic];

    pub fn name(&self) -> &'static str {
        match self {
            Method::Euler => "euler",
            Method::Midpoint => "midpoint",
            Method::RungeKutta4 => "rk4",
            Method::Analytic => "analytic",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euler" | "taylor" => Ok(Method::Euler),
            "midpoint" => Ok(Method::Midpoint),
            "rk4" | "runge_kutta" => Ok(Method::RungeKutta4),
            "analytic" => Ok(Method::Analytic),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

fn default_periods() -> f64 {
    1.0
}

/// Physical and numerical parameters shared by every particle of a run
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub e_field: f64, // electric field magnitude E
    pub b_field: f64, // magnetic field magnitude B
    pub mass: f64,    // particle mass m
    pub charge: f64,  // particle charge q
    pub dt: f64,      // fixed time step
    pub radius: f64,  // filter bore radius R
    pub length: f64,  // filter length L
    #[serde(default = "default_periods")]
    pub periods: f64, // bounded horizon, in cyclotron periods
    pub method: Method, // integrator used by the filter study
}

/// Single deterministic particle per (method, dt), compared with the analytic solution
#[derive(Deserialize, Debug, Clone)]
pub struct ConvergenceConfig {
    pub methods: Vec<Method>, // integrators to compare
    pub dts: Vec<f64>,        // step sizes, usually halving
}

fn default_bins() -> usize {
    20
}

/// Monte-Carlo filter efficiency study
#[derive(Deserialize, Debug, Clone)]
pub struct FilterConfig {
    pub n_particles: usize, // ensemble size
    pub seed: u64,          // deterministic seed for the initial conditions
    pub v_min: f64,         // lower edge of the injected vz band
    pub v_max: f64,         // upper edge of the injected vz band
    pub max_steps: u64,     // step cap for particles that never crash or pass
    #[serde(default = "default_bins")]
    pub bins: usize,        // exit velocity histogram bins
}

fn default_output_dir() -> String {
    "out".to_string()
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub parameters: ParametersConfig, // field, particle, geometry and method
    pub convergence: Option<ConvergenceConfig>, // part b style sweep
    pub filter: Option<FilterConfig>, // part c style Monte-Carlo study
    #[serde(default = "default_output_dir")]
    pub output_dir: String, // directory for CSV output
}
