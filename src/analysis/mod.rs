pub mod outcome;
pub mod convergence;
