//! Fixed-step time integrators for a single particle
//!
//! Provides explicit Euler (Taylor), midpoint (RK2) and classical RK4 steps
//! plus the closed-form solution used as a reference. Every step is a pure
//! function of the previous `TimedState` and `FieldParameters`; stage vectors
//! live on the stack and are dropped when the step returns.
//!
//! The system is r' = v, v' = a(v). Since `a` ignores position, each step
//! integrates the velocity equation first and then builds the position stages
//! from the same pre-step velocity and the velocity stage estimates. The new
//! velocity of the step is never fed back into the position update.

use crate::configuration::config::Method;
use crate::simulation::forces::lorentz_acceleration;
use crate::simulation::params::FieldParameters;
use crate::simulation::states::{NVec2, State, TimedState};

/// Advance `last` to time `t` with the integrator selected in `params`
///
/// The stepping schemes use the fixed `params.dt()`; the analytic solution is
/// evaluated directly at `t`.
pub fn step(last: &TimedState, t: f64, params: &FieldParameters) -> State {
    match params.method() {
        Method::Euler => euler_step(&last.state, params.dt(), params),
        Method::Midpoint => midpoint_step(&last.state, params.dt(), params),
        Method::RungeKutta4 => rk4_step(&last.state, params.dt(), params),
        Method::Analytic => analytic_state(t, params),
    }
}

/// Explicit first order step
/// v_n+1 = v_n + dt a(v_n), r_n+1 = r_n + dt v_n (old velocity, not semi-implicit)
pub fn euler_step(s: &State, dt: f64, params: &FieldParameters) -> State {
    let a = lorentz_acceleration(&s.v, params);

    let v = s.v + a * dt;
    let r = s.r + s.v * dt;

    State { r, v }
}

/// Explicit midpoint (RK2) step
pub fn midpoint_step(s: &State, dt: f64, params: &FieldParameters) -> State {
    // Velocity stages
    // k1 = dt a(v), k2 = dt a(v + k1/2)
    let k1_v = lorentz_acceleration(&s.v, params) * dt;
    let k2_v = lorentz_acceleration(&(s.v + k1_v * 0.5), params) * dt;
    let v = s.v + k2_v;

    // Position stages, velocity plays the role of the right-hand side
    // k2 = dt (v + k1_v/2), the k1 = dt v stage drops out of the midpoint update
    let k2_r = (s.v + k1_v * 0.5) * dt;
    let r = s.r + k2_r;

    State { r, v }
}

/// Classical fourth order Runge–Kutta step
pub fn rk4_step(s: &State, dt: f64, params: &FieldParameters) -> State {
    // The velocity right-hand side has no explicit time dependence,
    // so k3 is the k2 formula applied to the k2 estimate
    let k1_v = lorentz_acceleration(&s.v, params) * dt;
    let k2_v = lorentz_acceleration(&(s.v + k1_v * 0.5), params) * dt;
    let k3_v = lorentz_acceleration(&(s.v + k2_v * 0.5), params) * dt;
    let k4_v = lorentz_acceleration(&(s.v + k3_v), params) * dt;
    let v = s.v + rk4_combine(&k1_v, &k2_v, &k3_v, &k4_v);

    // Position stages sample the velocity at the same stage points
    let k1_r = s.v * dt;
    let k2_r = (s.v + k1_v * 0.5) * dt;
    let k3_r = (s.v + k2_v * 0.5) * dt;
    let k4_r = (s.v + k3_v) * dt;
    let r = s.r + rk4_combine(&k1_r, &k2_r, &k3_r, &k4_r);

    State { r, v }
}

/// (k1 + 2 k2 + 2 k3 + k4) / 6
fn rk4_combine(k1: &NVec2, k2: &NVec2, k3: &NVec2, k4: &NVec2) -> NVec2 {
    (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0
}

/// Closed-form state at absolute time `t` for a particle launched from the
/// origin with v = (0, 3E/B)
///
/// r(t) = ( (2E/(wB)) (cos wt - 1), (E/B) t + (2E/(wB)) sin wt )
/// v(t) = ( -2 (E/B) sin wt, (E/B) (2 cos wt + 1) )
pub fn analytic_state(t: f64, params: &FieldParameters) -> State {
    let w = params.omega();
    let drift = params.drift_velocity(); // E/B
    let gyro = 2.0 * params.e_field() / (w * params.b_field()); // 2E/(wB)
    let (sin, cos) = (w * t).sin_cos();

    let r = NVec2::new(gyro * (cos - 1.0), drift * t + gyro * sin);
    let v = NVec2::new(-2.0 * drift * sin, drift * (2.0 * cos + 1.0));

    State { r, v }
}

/// Acceleration along the closed-form trajectory at time `t`
pub fn analytic_acceleration(t: f64, params: &FieldParameters) -> NVec2 {
    lorentz_acceleration(&analytic_state(t, params).v, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(method: Method) -> FieldParameters {
        FieldParameters::new(1.0, 1.0, 1.0, 1.0, 0.1, 1.0, 1.0, method).unwrap()
    }

    fn at_rest() -> State {
        State::new(NVec2::new(0.5, -0.25), NVec2::new(0.0, 0.0))
    }

    #[test]
    fn euler_moves_position_with_old_velocity() {
        let p = params(Method::Euler);
        let s = State::new(NVec2::new(0.0, 0.0), NVec2::new(2.0, 0.0));
        let next = euler_step(&s, 0.1, &p);

        // a = (1 - 0, 2) -> v' = (2.1, 0.2), r' uses v = (2, 0)
        assert!((next.v - NVec2::new(2.1, 0.2)).norm() < 1e-15);
        assert!((next.r - NVec2::new(0.2, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn midpoint_single_step_from_rest() {
        let p = params(Method::Midpoint);
        let next = midpoint_step(&at_rest(), 0.1, &p);

        // k1_v = (0.1, 0), k2_v = 0.1 a((0.05, 0)) = (0.1, 0.005)
        assert!((next.v - NVec2::new(0.1, 0.005)).norm() < 1e-15);
        // k2_r = 0.1 (0.05, 0)
        assert!((next.r - NVec2::new(0.505, -0.25)).norm() < 1e-15);
    }

    #[test]
    fn rk4_matches_taylor_series_of_one_step() {
        // For the unit problem the exact one-step velocity from rest is
        // (sin dt, 1 - cos dt); RK4 agrees to O(dt^5)
        let p = params(Method::RungeKutta4);
        let dt = 0.1_f64;
        let next = rk4_step(&at_rest(), dt, &p);

        let exact_v = NVec2::new(dt.sin(), 1.0 - dt.cos());
        let exact_r = NVec2::new(0.5 + 1.0 - dt.cos(), -0.25 + dt - dt.sin());
        assert!((next.v - exact_v).norm() < 1e-6);
        assert!((next.r - exact_r).norm() < 1e-6);
    }

    #[test]
    fn analytic_starts_at_deterministic_initial_condition() {
        let p = FieldParameters::new(2.0, 0.5, 1.0, 1.0, 0.1, 1.0, 1.0, Method::Analytic).unwrap();
        let s0 = analytic_state(0.0, &p);

        assert!(s0.r.norm() < 1e-15);
        assert!((s0.v - NVec2::new(0.0, 3.0 * p.drift_velocity())).norm() < 1e-12);
    }

    #[test]
    fn analytic_satisfies_equation_of_motion() {
        let p = FieldParameters::new(1.5, 0.7, 2.0, 1.3, 0.1, 1.0, 1.0, Method::Analytic).unwrap();
        let h = 1e-6;

        for t in [0.3, 1.7, 4.0] {
            let dv = (analytic_state(t + h, &p).v - analytic_state(t - h, &p).v) / (2.0 * h);
            let dr = (analytic_state(t + h, &p).r - analytic_state(t - h, &p).r) / (2.0 * h);

            assert!((dv - analytic_acceleration(t, &p)).norm() < 1e-6);
            assert!((dr - analytic_state(t, &p).v).norm() < 1e-6);
        }
    }

    #[test]
    fn dispatch_follows_method() {
        let last = TimedState { t: 0.0, state: at_rest() };
        for method in Method::ALL {
            let p = params(method);
            let expected = match method {
                Method::Euler => euler_step(&last.state, 0.1, &p),
                Method::Midpoint => midpoint_step(&last.state, 0.1, &p),
                Method::RungeKutta4 => rk4_step(&last.state, 0.1, &p),
                Method::Analytic => analytic_state(0.1, &p),
            };
            assert_eq!(step(&last, 0.1, &p), expected);
        }
    }
}
