//! wgpu compute-shader sweep
//!
//! Everything here sits behind the `gpu` feature. A [GpuContext] owns the
//! device, a [GpuSweep] owns the buffers and pipelines of one problem and
//! implements [TransportSweep](crate::TransportSweep), so it drops into a
//! [Solver](crate::Solver) in place of the CPU sweep.

mod context;
mod shaders;
mod sweep;

pub use context::GpuContext;
pub use sweep::GpuSweep;
