//! Core state types for the crossed-field particle simulation.
//!
//! Motion is planar in the (y, z) cross-section, so every vector is an
//! `NVec2` whose `x` component is `y` and whose `y` component is `z`.
//! - `State`      snapshot of position and velocity at one instant
//! - `TimedState` a `State` tagged with its simulated time

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub r: NVec2, // position (y, z)
    pub v: NVec2, // velocity (vy, vz)
}

impl State {
    pub fn new(r: NVec2, v: NVec2) -> Self {
        Self { r, v }
    }

    /// Lateral coordinate, across the filter bore
    pub fn y(&self) -> f64 {
        self.r.x
    }

    /// Longitudinal coordinate, along the filter axis
    pub fn z(&self) -> f64 {
        self.r.y
    }

    pub fn is_finite(&self) -> bool {
        self.r.iter().chain(self.v.iter()).all(|c| c.is_finite())
    }
}

/// One trajectory entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedState {
    pub t: f64, // simulated time
    pub state: State,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn componentwise_algebra() {
        let a = NVec2::new(1.0, 2.0);
        let b = NVec2::new(3.0, -4.0);

        assert_eq!(a + b, NVec2::new(4.0, -2.0));
        assert_eq!(a.component_mul(&b), NVec2::new(3.0, -8.0));
        assert_eq!(a * 0.5, NVec2::new(0.5, 1.0));
    }

    #[test]
    fn non_finite_state_detected() {
        let s = State::new(NVec2::new(0.0, f64::NAN), NVec2::zeros());
        assert!(!s.is_finite());
        assert!(State::new(NVec2::zeros(), NVec2::new(1.0, 2.0)).is_finite());
    }
}
