//! Post-run statistics over a completed `Simulation`
//!
//! Read-only: passing percentage, exit velocity histogram of the particles that
//! passed, and the initial conditions behind each outcome.

use crate::simulation::ensemble::Simulation;
use crate::simulation::params::ConfigError;

/// One histogram bucket, in normalized units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub from: f64,
    pub to: f64,
    pub count: usize,
}

/// Fixed-width histogram over min-max normalized values
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub range: Option<(f64, f64)>, // raw (min, max) used for normalization, None when empty
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Bucket `values` into `bins` equal bins spanning [0, 1] after min-max
    /// normalization. The maximum lands in the last bin; if every value is
    /// equal they all land in the first.
    pub fn normalized(values: &[f64], bins: usize) -> Result<Self, ConfigError> {
        if bins == 0 {
            return Err(ConfigError::ZeroBins);
        }

        let width = 1.0 / bins as f64;
        let mut out: Vec<Bin> = (0..bins)
            .map(|i| Bin {
                from: i as f64 * width,
                to: (i + 1) as f64 * width,
                count: 0,
            })
            .collect();

        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Ok(Self { range: None, bins: out });
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        for v in finite {
            let x = if span > 0.0 { (v - min) / span } else { 0.0 };
            let i = ((x * bins as f64).floor() as usize).min(bins - 1);
            out[i].count += 1;
        }

        Ok(Self { range: Some((min, max)), bins: out })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Initial condition of one particle, scaled for plotting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialPoint {
    pub y_over_r: f64, // r.y / R, in [-1, 1]
    pub vz: f64,
}

/// First particle of each terminal class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exemplars {
    pub passed: Option<usize>,
    pub crashed: Option<usize>,
}

pub struct OutcomeAnalyzer<'a> {
    sim: &'a Simulation,
}

impl<'a> OutcomeAnalyzer<'a> {
    pub fn new(sim: &'a Simulation) -> Self {
        Self { sim }
    }

    /// 100 (1 - crashed / n) over the particles that ended crashed, passed or
    /// active; anomalies are left out of n. `None` when nothing is left.
    pub fn passing_percentage(&self) -> Option<f64> {
        let n = self.sim.len() - self.anomaly_count();
        if n == 0 {
            return None;
        }
        Some(100.0 * (1.0 - self.sim.crash_counter() as f64 / n as f64))
    }

    /// Particles that did not terminate, went non-finite or had a step rejected
    pub fn anomaly_count(&self) -> usize {
        self.sim.anomalies().count()
    }

    /// Final recorded vz of every particle that passed
    pub fn exit_velocities(&self) -> Vec<f64> {
        self.sim
            .particles()
            .iter()
            .filter(|p| p.passed())
            .map(|p| p.last().state.v.y)
            .collect()
    }

    pub fn exit_velocity_histogram(&self, bins: usize) -> Result<Histogram, ConfigError> {
        Histogram::normalized(&self.exit_velocities(), bins)
    }

    pub fn initial_conditions(&self, only_passed: bool) -> Vec<InitialPoint> {
        let radius = self.sim.params().radius();
        self.sim
            .particles()
            .iter()
            .filter(|p| !only_passed || p.passed())
            .map(|p| {
                let s = p.initial().state;
                InitialPoint { y_over_r: s.y() / radius, vz: s.v.y }
            })
            .collect()
    }

    pub fn exemplars(&self) -> Exemplars {
        let particles = self.sim.particles();
        Exemplars {
            passed: particles.iter().position(|p| p.passed()),
            crashed: particles.iter().position(|p| p.crashed()),
        }
    }
}
