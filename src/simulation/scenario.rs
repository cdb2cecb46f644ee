//! Build fully-validated experiments from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime `Scenario`:
//! - shared `FieldParameters`
//! - an optional convergence sweep (method × dt grid)
//! - an optional Monte-Carlo filter study
//! - the output directory
//!
//! Every configuration error surfaces here, before any particle is stepped.

use std::path::PathBuf;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::configuration::config::{ConvergenceConfig, FilterConfig, Method, ScenarioConfig};
use crate::simulation::engine::RunMode;
use crate::simulation::ensemble::{InitialCondition, Simulation};
use crate::simulation::params::{ConfigError, FieldParameters};

/// Single-particle sweep against the analytic solution
#[derive(Debug, Clone)]
pub struct ConvergenceStudy {
    pub methods: Vec<Method>,
    pub dts: Vec<f64>,
}

impl ConvergenceStudy {
    fn build(cfg: ConvergenceConfig) -> Result<Self, ConfigError> {
        if cfg.methods.is_empty() || cfg.dts.is_empty() {
            return Err(ConfigError::EmptySweep);
        }
        if let Some(&dt) = cfg.dts.iter().find(|dt| !(**dt > 0.0 && dt.is_finite())) {
            return Err(ConfigError::NonPositive { name: "dt", value: dt });
        }
        Ok(Self {
            methods: cfg.methods,
            dts: cfg.dts,
        })
    }
}

/// Monte-Carlo velocity filter study
#[derive(Debug, Clone)]
pub struct FilterStudy {
    pub n_particles: usize,
    pub seed: u64,
    pub init: InitialCondition,
    pub mode: RunMode,
    pub bins: usize,
}

impl FilterStudy {
    fn build(cfg: FilterConfig) -> Result<Self, ConfigError> {
        if cfg.n_particles == 0 {
            return Err(ConfigError::ZeroParticles);
        }
        if cfg.max_steps == 0 {
            return Err(ConfigError::ZeroStepCap);
        }
        if cfg.bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        let init = InitialCondition::Random { v_min: cfg.v_min, v_max: cfg.v_max };
        init.validate()?;

        Ok(Self {
            n_particles: cfg.n_particles,
            seed: cfg.seed,
            init,
            mode: RunMode::Unbounded { max_steps: cfg.max_steps },
            bins: cfg.bins,
        })
    }

    /// Seeded ensemble for this study
    pub fn build_simulation(&self, params: Arc<FieldParameters>) -> Result<Simulation, ConfigError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Simulation::new(self.n_particles, params, self.init, &mut rng)
    }
}

/// Runtime bundle constructed from a [`ScenarioConfig`]
#[derive(Debug, Clone)]
pub struct Scenario {
    pub parameters: Arc<FieldParameters>,
    pub convergence: Option<ConvergenceStudy>,
    pub filter: Option<FilterStudy>,
    pub output_dir: PathBuf,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, ConfigError> {
        // Parameters (runtime) from ParametersConfig
        let parameters = FieldParameters::from_config(&cfg.parameters)?;

        let convergence = cfg.convergence.map(ConvergenceStudy::build).transpose()?;
        let filter = cfg.filter.map(FilterStudy::build).transpose()?;

        Ok(Self {
            parameters: Arc::new(parameters),
            convergence,
            filter,
            output_dir: PathBuf::from(cfg.output_dir),
        })
    }

    /// Same scenario with every study using `method`
    pub fn with_method(mut self, method: Method) -> Self {
        self.parameters = Arc::new((*self.parameters).clone().with_method(method));
        if let Some(study) = self.convergence.as_mut() {
            study.methods = vec![method];
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> ScenarioConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    const BASE: &str = r#"
parameters:
  e_field: 1.0
  b_field: 1.0
  mass: 1.0
  charge: 1.0
  dt: 0.01
  radius: 0.5
  length: 2.0
  periods: 2
  method: "rk4"
"#;

    #[test]
    fn builds_both_studies() {
        let yaml = format!(
            "{BASE}convergence:\n  methods: [euler, rk4]\n  dts: [0.1, 0.05]\nfilter:\n  n_particles: 8\n  seed: 1\n  v_min: 0.9\n  v_max: 1.1\n  max_steps: 100\n  bins: 5\n"
        );
        let s = Scenario::build_scenario(config(&yaml)).unwrap();

        assert!((s.parameters.t_end() - 4.0 * std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(s.convergence.as_ref().unwrap().methods, vec![Method::Euler, Method::RungeKutta4]);

        let filter = s.filter.unwrap();
        assert_eq!(filter.mode, RunMode::Unbounded { max_steps: 100 });
        let sim = filter.build_simulation(Arc::clone(&s.parameters)).unwrap();
        assert_eq!(sim.len(), 8);
    }

    #[test]
    fn rejects_bad_studies() {
        let empty = format!("{BASE}convergence:\n  methods: []\n  dts: [0.1]\n");
        assert_eq!(Scenario::build_scenario(config(&empty)).err(), Some(ConfigError::EmptySweep));

        let bad_dt = format!("{BASE}convergence:\n  methods: [euler]\n  dts: [0.1, 0.0]\n");
        assert!(matches!(
            Scenario::build_scenario(config(&bad_dt)),
            Err(ConfigError::NonPositive { name: "dt", .. })
        ));

        let no_cap = format!(
            "{BASE}filter:\n  n_particles: 8\n  seed: 1\n  v_min: 0.9\n  v_max: 1.1\n  max_steps: 0\n"
        );
        assert_eq!(Scenario::build_scenario(config(&no_cap)).err(), Some(ConfigError::ZeroStepCap));

        let band = format!(
            "{BASE}filter:\n  n_particles: 8\n  seed: 1\n  v_min: 2.0\n  v_max: 1.0\n  max_steps: 10\n"
        );
        assert!(matches!(
            Scenario::build_scenario(config(&band)),
            Err(ConfigError::InvalidVelocityBand { .. })
        ));
    }

    #[test]
    fn method_override_applies_everywhere() {
        let yaml = format!("{BASE}convergence:\n  methods: [euler, rk4]\n  dts: [0.1]\n");
        let s = Scenario::build_scenario(config(&yaml)).unwrap().with_method(Method::Midpoint);

        assert_eq!(s.parameters.method(), Method::Midpoint);
        assert_eq!(s.convergence.unwrap().methods, vec![Method::Midpoint]);
    }
}
