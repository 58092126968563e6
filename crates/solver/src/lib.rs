//! Source iteration and transport sweeps for 2D MOC
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod cancel;
mod convergence;
mod cpu;
mod error;
mod options;
mod polar;
mod problem;
mod rebalance;
mod report;
mod solver;
mod sweep;

#[cfg(feature = "gpu")]
mod gpu;

#[doc(inline)]
pub use solver::{CpuSolver, Solver};

#[cfg(feature = "gpu")]
#[doc(inline)]
pub use solver::GpuSolver;

#[doc(inline)]
pub use convergence::{Convergence, ConvergenceStatus};

#[doc(inline)]
pub use cancel::CancelFlag;

#[doc(inline)]
pub use options::SolverOptions;

#[doc(inline)]
pub use polar::PolarQuadrature;

#[doc(inline)]
pub use problem::{SweepProblem, SweepTrack};

#[doc(inline)]
pub use sweep::{SweepOutput, TransportSweep};

#[doc(inline)]
pub use cpu::CpuSweep;

#[cfg(feature = "gpu")]
#[doc(inline)]
pub use gpu::{GpuContext, GpuSweep};

#[doc(inline)]
pub use report::{FluxReport, RegionReport};

#[doc(inline)]
pub use error::{Error, Result};
