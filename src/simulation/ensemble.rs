//! Ensemble driver
//!
//! A `Simulation` owns a set of independent particles sharing one
//! `FieldParameters`. `run` drives every particle to termination under a
//! `RunMode`; particles never interact, so they are advanced in parallel with
//! rayon and the outcomes are tallied afterwards.

use std::sync::Arc;

use rand::Rng;
use rayon::prelude::*;

use crate::simulation::engine::RunMode;
use crate::simulation::params::{ConfigError, FieldParameters};
use crate::simulation::particle::{Particle, Status, StepError};
use crate::simulation::states::{NVec2, State};

/// Uniform real sampling on a closed interval, supplied by the caller
pub trait UniformSampler {
    fn sample_uniform(&mut self, min: f64, max: f64) -> f64;
}

impl<R: Rng> UniformSampler for R {
    fn sample_uniform(&mut self, min: f64, max: f64) -> f64 {
        if min < max {
            self.gen_range(min..=max)
        } else {
            min
        }
    }
}

/// How initial conditions are chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialCondition {
    /// r = (0, 0), v = (0, 3 E/B); the analytic solution starts here
    Deterministic,
    /// r.y uniform in [-R, R], v.z uniform in [v_min, v_max], everything else zero
    Random { v_min: f64, v_max: f64 },
}

impl InitialCondition {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            InitialCondition::Deterministic => Ok(()),
            InitialCondition::Random { v_min, v_max } => {
                // the band width must be finite too, or uniform sampling overflows
                if v_min <= v_max && (v_max - v_min).is_finite() {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidVelocityBand { v_min, v_max })
                }
            }
        }
    }

    fn draw<S: UniformSampler + ?Sized>(&self, params: &FieldParameters, sampler: &mut S) -> State {
        match *self {
            InitialCondition::Deterministic => State::new(
                NVec2::zeros(),
                NVec2::new(0.0, 3.0 * params.drift_velocity()),
            ),
            InitialCondition::Random { v_min, v_max } => {
                let radius = params.radius();
                let y = sampler.sample_uniform(-radius, radius);
                let vz = sampler.sample_uniform(v_min, v_max);
                State::new(NVec2::new(y, 0.0), NVec2::new(0.0, vz))
            }
        }
    }
}

/// How a particle's last run ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    Active,  // bounded horizon reached while still in flight
    Crashed,
    Passed,
    DidNotTerminate { steps: u64 }, // hit the unbounded step cap
    NonFinite { t: f64 },           // state blew up at time t, particle frozen
    Rejected(StepError),
}

impl Termination {
    /// Outcomes that are reported instead of counted
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            Termination::DidNotTerminate { .. } | Termination::NonFinite { .. } | Termination::Rejected(_)
        )
    }
}

/// Outcome counts of one `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    pub crashed: usize,
    pub passed: usize,
    pub active: usize,
    pub did_not_terminate: usize,
    pub non_finite: usize,
    pub rejected: usize,
}

impl RunReport {
    fn tally(terminations: &[Termination]) -> Self {
        let mut report = RunReport { total: terminations.len(), ..Default::default() };
        for t in terminations {
            match t {
                Termination::Active => report.active += 1,
                Termination::Crashed => report.crashed += 1,
                Termination::Passed => report.passed += 1,
                Termination::DidNotTerminate { .. } => report.did_not_terminate += 1,
                Termination::NonFinite { .. } => report.non_finite += 1,
                Termination::Rejected(_) => report.rejected += 1,
            }
        }
        report
    }
}

pub struct Simulation {
    particles: Vec<Particle>,
    params: Arc<FieldParameters>,
    terminations: Vec<Termination>, // one per particle, from the latest run
    crash_counter: usize,
}

impl Simulation {
    /// Build `n` particles with initial conditions chosen by `init`
    ///
    /// `sampler` is only consulted for `InitialCondition::Random`.
    pub fn new<S: UniformSampler + ?Sized>(
        n: usize,
        params: Arc<FieldParameters>,
        init: InitialCondition,
        sampler: &mut S,
    ) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::ZeroParticles);
        }
        init.validate()?;

        let states: Vec<State> = (0..n).map(|_| init.draw(&params, &mut *sampler)).collect();
        Ok(Self::from_initial_states(states, params))
    }

    /// `n` particles at the deterministic initial condition
    pub fn deterministic(n: usize, params: Arc<FieldParameters>) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::ZeroParticles);
        }
        let start = State::new(NVec2::zeros(), NVec2::new(0.0, 3.0 * params.drift_velocity()));
        Ok(Self::from_initial_states(vec![start; n], params))
    }

    /// One particle per supplied initial state
    pub fn from_initial_states(states: Vec<State>, params: Arc<FieldParameters>) -> Self {
        let particles: Vec<Particle> = states
            .into_iter()
            .map(|s| Particle::new(s, Arc::clone(&params)))
            .collect();
        let terminations = vec![Termination::Active; particles.len()];

        Self {
            particles,
            params,
            terminations,
            crash_counter: 0,
        }
    }

    /// Drive every particle under `mode` and tally the outcomes
    ///
    /// A particle that blows up or never terminates is recorded and skipped;
    /// it never stops the rest of the ensemble.
    pub fn run(&mut self, mode: RunMode) -> RunReport {
        log::info!(
            "running {} particles, method = {}, mode = {}, dt = {:e}",
            self.particles.len(),
            self.params.method(),
            mode.name(),
            self.params.dt()
        );

        let params = &*self.params;
        self.terminations = self
            .particles
            .par_iter_mut()
            .map(|p| drive(p, mode, params))
            .collect();

        for (i, t) in self.terminations.iter().enumerate().filter(|(_, t)| t.is_anomaly()) {
            log::debug!("particle {i}: {t:?}");
        }

        let report = RunReport::tally(&self.terminations);
        self.crash_counter = report.crashed;

        if report.did_not_terminate + report.non_finite + report.rejected > 0 {
            log::warn!(
                "{} particles did not terminate, {} went non-finite, {} had rejected steps",
                report.did_not_terminate,
                report.non_finite,
                report.rejected
            );
        }
        log::info!(
            "run finished: {} crashed, {} passed, {} active",
            report.crashed,
            report.passed,
            report.active
        );

        report
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn into_particles(self) -> Vec<Particle> {
        self.particles
    }

    pub fn particle(&self, i: usize) -> Option<&Particle> {
        self.particles.get(i)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn params(&self) -> &FieldParameters {
        &self.params
    }

    /// Particles that ended crashed in the latest run
    pub fn crash_counter(&self) -> usize {
        self.crash_counter
    }

    /// Per-particle outcome of the latest run
    pub fn terminations(&self) -> &[Termination] {
        &self.terminations
    }

    /// (index, outcome) of every particle reported as an anomaly
    pub fn anomalies(&self) -> impl Iterator<Item = (usize, &Termination)> + '_ {
        self.terminations.iter().enumerate().filter(|(_, t)| t.is_anomaly())
    }
}

/// Step one particle until `mode` says stop
fn drive(particle: &mut Particle, mode: RunMode, params: &FieldParameters) -> Termination {
    let dt = params.dt();
    // time keys are k dt; resume after whatever the particle already holds
    let first = particle.history().len() as u64;
    let mut taken: u64 = 0;

    for k in first.. {
        let t = k as f64 * dt;

        match mode {
            RunMode::Bounded if t >= params.t_end() => break,
            RunMode::Unbounded { .. } if !particle.is_active() => break,
            RunMode::Unbounded { max_steps } if taken >= max_steps => {
                return Termination::DidNotTerminate { steps: taken };
            }
            _ => {}
        }

        if let Err(e) = particle.advance(t) {
            return Termination::Rejected(e);
        }
        taken += 1;

        if !particle.last().state.is_finite() {
            return Termination::NonFinite { t };
        }
    }

    match particle.status() {
        Status::Active => Termination::Active,
        Status::Crashed => Termination::Crashed,
        Status::Passed => Termination::Passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::config::Method;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(radius: f64, length: f64) -> Arc<FieldParameters> {
        Arc::new(FieldParameters::new(1.0, 1.0, 1.0, 1.0, 0.01, radius, length, Method::RungeKutta4).unwrap())
    }

    #[test]
    fn deterministic_initial_condition() {
        let sim = Simulation::deterministic(3, params(1.0, 1.0)).unwrap();
        assert_eq!(sim.len(), 3);
        for p in sim.particles() {
            assert_eq!(p.initial().state, State::new(NVec2::zeros(), NVec2::new(0.0, 3.0)));
        }
    }

    #[test]
    fn random_initial_condition_stays_in_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let init = InitialCondition::Random { v_min: 2.0, v_max: 2.5 };
        let sim = Simulation::new(500, params(0.003, 1.0), init, &mut rng).unwrap();

        for p in sim.particles() {
            let s = p.initial().state;
            assert!(s.y().abs() <= 0.003);
            assert_eq!(s.z(), 0.0);
            assert_eq!(s.v.x, 0.0);
            assert!((2.0..=2.5).contains(&s.v.y));
        }
    }

    #[test]
    fn same_seed_same_ensemble() {
        let init = InitialCondition::Random { v_min: 0.0, v_max: 1.0 };
        let a = Simulation::new(20, params(1.0, 1.0), init, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = Simulation::new(20, params(1.0, 1.0), init, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();

        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.initial(), pb.initial());
        }
    }

    #[test]
    fn construction_errors() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            Simulation::new(0, params(1.0, 1.0), InitialCondition::Deterministic, &mut rng).err(),
            Some(ConfigError::ZeroParticles)
        );
        let band = InitialCondition::Random { v_min: 2.0, v_max: 1.0 };
        assert!(matches!(
            Simulation::new(4, params(1.0, 1.0), band, &mut rng),
            Err(ConfigError::InvalidVelocityBand { .. })
        ));
        let wide = InitialCondition::Random { v_min: -1e308, v_max: 1e308 };
        assert!(matches!(
            Simulation::new(4, params(1.0, 1.0), wide, &mut rng),
            Err(ConfigError::InvalidVelocityBand { .. })
        ));
        assert_eq!(Simulation::deterministic(0, params(1.0, 1.0)).err(), Some(ConfigError::ZeroParticles));
    }

    #[test]
    fn deterministic_matches_explicit_construction() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = Simulation::deterministic(3, params(1.0, 1.0)).unwrap();
        let b = Simulation::new(3, params(1.0, 1.0), InitialCondition::Deterministic, &mut rng).unwrap();

        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.history(), pb.history());
        }
    }

    #[test]
    fn degenerate_band_samples_its_edge() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(rng.sample_uniform(4.0, 4.0), 4.0);
    }

    #[test]
    fn bounded_run_stops_before_horizon() {
        let mut sim = Simulation::deterministic(2, params(100.0, 1e6)).unwrap();
        let report = sim.run(RunMode::Bounded);

        assert_eq!(report.active, 2);
        let t_end = sim.params().t_end();
        for p in sim.particles() {
            let last = p.last().t;
            assert!(last < t_end);
            assert!(last + 0.01 >= t_end - 1e-12);
        }
    }

    #[test]
    fn crash_counter_matches_flags() {
        // Half start on the wall, half at the axis moving at drift speed
        let p = params(0.5, 2.0);
        let states: Vec<State> = (0..10)
            .map(|i| {
                let y = if i % 2 == 0 { 0.5 } else { 0.0 };
                State::new(NVec2::new(y, 0.0), NVec2::new(0.0, 1.0))
            })
            .collect();
        let mut sim = Simulation::from_initial_states(states, p);
        let report = sim.run(RunMode::Unbounded { max_steps: 10_000 });

        assert_eq!(report.crashed, 5);
        assert_eq!(report.passed, 5);
        assert_eq!(sim.crash_counter(), sim.particles().iter().filter(|p| p.crashed()).count());
    }
}
