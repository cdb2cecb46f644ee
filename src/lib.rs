pub mod simulation;
pub mod configuration;
pub mod analysis;
pub mod export;
pub mod benchmark;

pub use simulation::states::{State, TimedState, NVec2};
pub use simulation::params::{FieldParameters, ConfigError};
pub use simulation::forces::lorentz_acceleration;
pub use simulation::integrator::{step, euler_step, midpoint_step, rk4_step, analytic_state, analytic_acceleration};
pub use simulation::particle::{Particle, Status, StepError};
pub use simulation::engine::RunMode;
pub use simulation::ensemble::{Simulation, InitialCondition, UniformSampler, Termination, RunReport};
pub use simulation::scenario::{Scenario, ConvergenceStudy, FilterStudy};

pub use configuration::config::{Method, ParametersConfig, ConvergenceConfig, FilterConfig, ScenarioConfig};

pub use analysis::outcome::{OutcomeAnalyzer, Histogram, Bin, InitialPoint, Exemplars};
pub use analysis::convergence::{ConvergenceRow, sweep, observed_orders, trajectory_error, reference_particle};

pub use benchmark::benchmark::{bench_methods, bench_ensemble};
