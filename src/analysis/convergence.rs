//! Convergence of the stepping integrators towards the closed-form solution
//!
//! One deterministic particle per (method, dt) is driven in bounded mode and
//! its final state is compared with `analytic_state` at the same time.

use std::sync::Arc;

use crate::configuration::config::Method;
use crate::simulation::engine::RunMode;
use crate::simulation::ensemble::Simulation;
use crate::simulation::integrator::analytic_state;
use crate::simulation::params::{ConfigError, FieldParameters};
use crate::simulation::particle::Particle;

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceRow {
    pub method: Method,
    pub dt: f64,
    pub steps: usize,          // recorded steps, excluding t = 0
    pub position_error: f64,   // |r - r_exact| at the last recorded time
    pub velocity_error: f64,   // |v - v_exact| at the last recorded time
}

/// Distance between the last recorded position and the analytic one
///
/// Only meaningful for a particle launched from the deterministic initial condition.
pub fn trajectory_error(particle: &Particle) -> f64 {
    let last = particle.last();
    let exact = analytic_state(last.t, particle.params());
    (last.state.r - exact.r).norm()
}

fn velocity_error(particle: &Particle) -> f64 {
    let last = particle.last();
    let exact = analytic_state(last.t, particle.params());
    (last.state.v - exact.v).norm()
}

/// Deterministic particle driven to the bounded horizon with `params`
pub fn reference_particle(params: FieldParameters) -> Result<Particle, ConfigError> {
    let mut sim = Simulation::deterministic(1, Arc::new(params))?;
    sim.run(RunMode::Bounded);
    // deterministic() never builds an empty ensemble
    sim.into_particles().pop().ok_or(ConfigError::ZeroParticles)
}

/// Run every (method, dt) pair, methods in the outer loop
pub fn sweep(params: &FieldParameters, methods: &[Method], dts: &[f64]) -> Result<Vec<ConvergenceRow>, ConfigError> {
    if methods.is_empty() || dts.is_empty() {
        return Err(ConfigError::EmptySweep);
    }

    let mut rows = Vec::with_capacity(methods.len() * dts.len());
    for &method in methods {
        for &dt in dts {
            let p = params.clone().with_method(method).with_dt(dt)?;
            let particle = reference_particle(p)?;

            rows.push(ConvergenceRow {
                method,
                dt,
                steps: particle.history().len() - 1,
                position_error: trajectory_error(&particle),
                velocity_error: velocity_error(&particle),
            });
        }
    }
    Ok(rows)
}

/// Observed order log(e1/e2) / log(dt1/dt2) between consecutive rows of `method`
pub fn observed_orders(rows: &[ConvergenceRow], method: Method) -> Vec<f64> {
    let own: Vec<&ConvergenceRow> = rows.iter().filter(|r| r.method == method).collect();
    own.windows(2)
        .map(|w| (w[0].position_error / w[1].position_error).ln() / (w[0].dt / w[1].dt).ln())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> FieldParameters {
        FieldParameters::new(1.0, 1.0, 1.0, 1.0, 0.01, 100.0, 1e6, Method::Euler).unwrap()
    }

    #[test]
    fn analytic_method_has_no_error() {
        let particle = reference_particle(unit().with_method(Method::Analytic)).unwrap();
        assert!(trajectory_error(&particle) < 1e-12);
        assert!(velocity_error(&particle) < 1e-12);
    }

    #[test]
    fn sweep_covers_grid() {
        let rows = sweep(&unit(), &[Method::Euler, Method::Midpoint], &[0.1, 0.05, 0.025]).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].method, Method::Euler);
        assert_eq!(rows[3].method, Method::Midpoint);
        assert_eq!(rows[1].dt, 0.05);
        // t_k = k dt < 2π
        assert_eq!(rows[0].steps, 62);
        assert_eq!(observed_orders(&rows, Method::Midpoint).len(), 2);
    }

    #[test]
    fn sweep_rejects_bad_input() {
        assert_eq!(sweep(&unit(), &[], &[0.1]), Err(ConfigError::EmptySweep));
        assert!(sweep(&unit(), &[Method::Euler], &[-0.1]).is_err());
    }
}
