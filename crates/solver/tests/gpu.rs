//! CPU and GPU sweeps agree, skipped when no adapter is available
#![cfg(feature = "gpu")]

mod common;

use common::{generate, pin_cell};
use moctools_geometry::BoundaryType;
use moctools_solver::{
    CpuSweep, GpuSweep, PolarQuadrature, Solver, SweepOutput, SweepProblem, TransportSweep,
};
use rstest::rstest;

/// Gpu sweep, or `None` with a note when the machine has no adapter
fn gpu_sweep() -> Option<GpuSweep> {
    match GpuSweep::new() {
        Ok(sweep) => Some(sweep),
        Err(e) => {
            eprintln!("skipping gpu test: {e}");
            None
        }
    }
}

fn relative_difference(a: &[f64], b: &[f64]) -> f64 {
    let diff: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    let norm: f64 = a.iter().map(|x| x * x).sum();
    (diff / norm).sqrt()
}

#[rstest]
fn single_sweep_matches_cpu() {
    let Some(mut gpu) = gpu_sweep() else {
        return;
    };

    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = generate(&geometry, 16, 0.05);
    let problem = SweepProblem::new(&geometry, &generator, PolarQuadrature::default()).unwrap();

    let source: Vec<f64> = (0..problem.num_values())
        .map(|i| 0.1 + 0.05 * i as f64)
        .collect();
    let incoming: Vec<f64> = (0..problem.boundary_len())
        .map(|i| 0.2 + 0.01 * (i % 7) as f64)
        .collect();

    let mut cpu = CpuSweep::new(2).unwrap();
    let mut expected = SweepOutput::new(&problem);
    cpu.prepare(&problem).unwrap();
    cpu.sweep(&problem, &source, &incoming, &mut expected).unwrap();

    let mut found = SweepOutput::new(&problem);
    gpu.prepare(&problem).unwrap();
    gpu.sweep(&problem, &source, &incoming, &mut found).unwrap();

    assert!(relative_difference(&expected.outgoing, &found.outgoing) < 1e-5);
    assert!(relative_difference(&expected.tally, &found.tally) < 1e-4);
}

#[rstest]
fn converged_results_match_cpu() {
    let Some(gpu) = gpu_sweep() else {
        return;
    };

    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = generate(&geometry, 16, 0.05);

    let mut cpu_solver = Solver::new(&geometry, &generator).unwrap();
    cpu_solver.set_source_convergence_threshold(1e-8).unwrap();
    cpu_solver.converge_source(2000).unwrap();

    let mut gpu_solver = Solver::with_sweep(&geometry, &generator, gpu).unwrap();
    gpu_solver.set_source_convergence_threshold(1e-5).unwrap();
    gpu_solver.converge_source(2000).unwrap();
    assert_eq!(gpu_solver.sweep_name(), "gpu");

    let k = cpu_solver.keff();
    assert!((gpu_solver.keff() - k).abs() < 5e-4 * k);
    assert!(relative_difference(cpu_solver.scalar_flux(), gpu_solver.scalar_flux()) < 2e-3);
}
