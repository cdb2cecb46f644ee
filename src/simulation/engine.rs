//! High-level runtime engine settings
//!
//! Selects how far `Simulation::run` drives each particle.

/// Termination rule for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Step t_k = k dt while t_k < t_end, regardless of classification
    Bounded,
    /// Step until the particle crashes or passes, at most `max_steps` times
    Unbounded { max_steps: u64 },
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Bounded => "bounded",
            RunMode::Unbounded { .. } => "unbounded",
        }
    }
}
