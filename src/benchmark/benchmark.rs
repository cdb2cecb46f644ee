use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::configuration::config::Method;
use crate::simulation::engine::RunMode;
use crate::simulation::ensemble::{InitialCondition, Simulation};
use crate::simulation::integrator::step;
use crate::simulation::params::{ConfigError, FieldParameters};
use crate::simulation::states::{NVec2, State, TimedState};

/// Helper to build unit-field parameters for `method`
fn make_params(method: Method) -> Result<FieldParameters, ConfigError> {
    FieldParameters::new(1.0, 1.0, 1.0, 1.0, 1.0e-3, 1.0, 1.0, method)
}

/// Time a single integrator step for each method
/// Paste output directly into excel to graph
pub fn bench_methods() -> Result<(), ConfigError> {
    let steps = 1_000_000; // steps per method

    println!("method,ns_per_step");

    for method in Method::ALL {
        let params = make_params(method)?;
        let dt = params.dt();
        let mut last = TimedState {
            t: 0.0,
            state: State::new(NVec2::zeros(), NVec2::new(0.0, 3.0)),
        };

        let t0 = Instant::now();
        for k in 1..=steps {
            let t = k as f64 * dt;
            last = TimedState { t, state: step(&last, t, &params) };
        }
        let ns = t0.elapsed().as_secs_f64() * 1e9 / steps as f64;

        // keep the result alive so the loop is not optimized away
        std::hint::black_box(last);
        println!("{},{:.2}", method, ns);
    }
    Ok(())
}

/// Time a full filter study for a range of ensemble sizes
pub fn bench_ensemble() -> Result<(), ConfigError> {
    println!("N,ms");

    let params = Arc::new(make_params(Method::RungeKutta4)?);
    let init = InitialCondition::Random { v_min: 0.5, v_max: 1.5 };

    for n in [100, 200, 400, 800, 1600, 3200] {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut sim = Simulation::new(n, Arc::clone(&params), init, &mut rng)?;

        let t0 = Instant::now();
        sim.run(RunMode::Unbounded { max_steps: 100_000 });
        let ms = t0.elapsed().as_secs_f64() * 1000.0;

        println!("{},{:.3}", n, ms);
    }
    Ok(())
}
