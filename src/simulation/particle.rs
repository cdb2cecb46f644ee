//! A single simulated particle: its trajectory and its filter classification
//!
//! The trajectory is an append-only buffer of `TimedState`s with strictly
//! increasing times, starting with the initial condition at t = 0. After every
//! step the newest state is checked against the filter geometry:
//! - crashed: |y| >= R while z <= L (hit the bore wall before the exit plane)
//! - passed:  z > L (reached the exit plane)
//!
//! Once set, the classification is sticky.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::simulation::integrator;
use crate::simulation::params::FieldParameters;
use crate::simulation::states::{State, TimedState};

/// Filter classification of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,  // still inside the bore, before the exit plane
    Crashed, // touched the wall
    Passed,  // left through the exit plane
}

/// Rejected step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepError {
    NonMonotonicTime { last: f64, requested: f64 },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StepError::NonMonotonicTime { last, requested } => write!(
                f,
                "step to t = {requested} does not advance past the last recorded t = {last}"
            ),
        }
    }
}

impl Error for StepError {}

#[derive(Debug, Clone)]
pub struct Particle {
    history: Vec<TimedState>, // trajectory, never empty, strictly increasing t
    params: Arc<FieldParameters>, // shared read-only run configuration
    status: Status,
}

impl Particle {
    /// New particle with `initial` recorded at t = 0
    pub fn new(initial: State, params: Arc<FieldParameters>) -> Self {
        Self {
            history: vec![TimedState { t: 0.0, state: initial }],
            params,
            status: Status::Active,
        }
    }

    /// Integrate one step up to time `t`, append the result and classify it
    ///
    /// `t` must be strictly greater than the last recorded time; otherwise the
    /// history is left untouched and an error is returned.
    pub fn advance(&mut self, t: f64) -> Result<Status, StepError> {
        let last = *self.last();
        // also rejects NaN
        if !(t > last.t) {
            return Err(StepError::NonMonotonicTime { last: last.t, requested: t });
        }

        let next = integrator::step(&last, t, &self.params);
        self.history.push(TimedState { t, state: next });
        self.classify(&next);

        Ok(self.status)
    }

    fn classify(&mut self, s: &State) {
        // Sticky, and a non-finite state carries no geometric meaning
        if self.status != Status::Active || !s.is_finite() {
            return;
        }

        let (radius, length) = (self.params.radius(), self.params.length());

        if s.y().abs() >= radius && s.z() <= length {
            self.status = Status::Crashed;
        } else if s.z() > length {
            self.status = Status::Passed;
        }
    }

    /// Full trajectory, ordered by time
    pub fn history(&self) -> &[TimedState] {
        &self.history
    }

    /// Initial condition at t = 0
    pub fn initial(&self) -> &TimedState {
        &self.history[0]
    }

    /// Most recent entry
    pub fn last(&self) -> &TimedState {
        &self.history[self.history.len() - 1]
    }

    pub fn params(&self) -> &FieldParameters {
        &self.params
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn crashed(&self) -> bool {
        self.status == Status::Crashed
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}
