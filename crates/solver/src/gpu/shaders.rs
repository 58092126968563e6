//! WGSL sources, embedded at compile time

/// Sweep kernel
///
/// Entry point `sweep`, one invocation per (track, direction). Writes the
/// outgoing boundary flux and per-segment tallies summed over polar angles.
pub const SWEEP: &str = include_str!("shaders/sweep.wgsl");

/// Reduction kernel
///
/// Entry point `reduce`, one invocation per (fsr, group). Sums the segment
/// tallies of both directions over the segments crossing each FSR.
pub const REDUCE: &str = include_str!("shaders/reduce.wgsl");

/// Invocations per workgroup, matches `@workgroup_size` in both kernels
pub const WORKGROUP_SIZE: u32 = 64;

/// Largest workgroup count in one dispatch dimension
pub const MAX_WORKGROUPS: u32 = 65_535;

/// Workgroups in (x, y) and invocations per row for `total` invocations
///
/// Work beyond the per-dimension limit spills into a second dimension.
pub fn dispatch_size(total: u32) -> (u32, u32, u32) {
    let groups = total.div_ceil(WORKGROUP_SIZE).max(1);
    let x = groups.min(MAX_WORKGROUPS);
    let y = groups.div_ceil(x);
    (x, y, x * WORKGROUP_SIZE)
}
