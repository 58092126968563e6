//! Outcome of a source iteration

// moctools modules
use moctools_utils::ValueExt;

// external crates
use serde::{Deserialize, Serialize};

/// How the source iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Residual fell below the threshold
    Converged,
    /// Ran out of iterations first
    NotConverged,
    /// Stopped early by a [CancelFlag](crate::CancelFlag)
    Cancelled,
}

/// Summary returned by [converge_source()](crate::Solver::converge_source)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub status: ConvergenceStatus,
    /// Completed iterations
    pub iterations: usize,
    /// Eigenvalue after the last iteration, 1 for fixed source problems
    pub keff: f64,
    /// Residual of the last iteration
    pub residual: f64,
}

impl Convergence {
    pub fn is_converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

impl std::fmt::Display for Convergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} after {} iterations, k = {}, residual = {}",
            self.status,
            self.iterations,
            self.keff.sci(6, 2),
            self.residual.sci(3, 2)
        )
    }
}
