//! Solver parameters

// crate modules
use crate::error::{Error, Result};

// external crates
use serde::{Deserialize, Serialize};

/// Parameters of the source iteration
///
/// Defaults to a single thread, a residual threshold of `1e-5`, three polar
/// angles and the group rebalance switched on.
///
/// ```rust
/// # use moctools_solver::SolverOptions;
/// let options = SolverOptions {
///     num_threads: 4,
///     ..Default::default()
/// };
///
/// assert!(options.validate().is_ok());
/// assert_eq!(options.num_polar, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Worker threads used by the CPU sweep
    pub num_threads: usize,
    /// Iteration stops once the residual falls below this value
    pub threshold: f64,
    /// Number of Tabuchi-Yamamoto polar angles, 1 to 3
    pub num_polar: usize,
    /// Rescale each group after every sweep to restore whole-domain balance
    ///
    /// Removes the slow global error mode so the residual decreases from the
    /// first iterations. The converged solution is the same either way.
    #[serde(default = "rebalance_default")]
    pub rebalance: bool,
}

fn rebalance_default() -> bool {
    true
}

impl SolverOptions {
    /// Check every parameter is usable
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(Error::InvalidThreadCount);
        }

        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(Error::InvalidThreshold(self.threshold));
        }

        if !(1..=3).contains(&self.num_polar) {
            return Err(Error::InvalidPolarAngles(self.num_polar));
        }

        Ok(())
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            num_threads: 1,
            threshold: 1e-5,
            num_polar: 3,
            rebalance: rebalance_default(),
        }
    }
}
