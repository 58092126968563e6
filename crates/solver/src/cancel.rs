//! Cooperative cancellation

// standard library
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag asking a running solver to stop
///
/// Clones share the same flag, so one can be handed to another thread (or
/// a signal handler) while the solver keeps its own. The solver checks the
/// flag before every iteration and returns with the last complete state.
///
/// ```rust
/// # use moctools_solver::CancelFlag;
/// let flag = CancelFlag::new();
/// let handle = flag.clone();
///
/// handle.cancel();
/// assert!(flag.is_cancelled());
///
/// flag.reset();
/// assert!(!handle.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Default::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
