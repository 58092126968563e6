//! The simple lattice converged on the CPU and again on the GPU

mod lattice;
mod materials;

use moctools::solver::Solver;
use moctools::tracks::TrackGenerator;
use moctools::utils::{Timer, ValueExt};

use log::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    stderrlog::new()
        .modules([
            module_path!(),
            "moctools_geometry",
            "moctools_tracks",
            "moctools_solver",
            "moctools_utils",
        ])
        .verbosity(2usize)
        .init()?;

    let geometry = lattice::simple_lattice()?;
    let mut generator = TrackGenerator::new(&geometry, 16, 0.1)?;
    generator.generate_tracks()?;

    let mut timer = Timer::new();

    let mut cpu = Solver::new(&geometry, &generator)?;
    cpu.set_num_threads(4)?;
    cpu.set_source_convergence_threshold(1e-3)?;
    timer.start();
    cpu.converge_source(1000)?;
    timer.stop();
    timer.record_split("Fixed source iteration");
    timer.reset();

    info!("Initialising the solver on the GPU");
    let mut gpu = Solver::new_gpu(&geometry, &generator)?;
    gpu.set_source_convergence_threshold(1e-3)?;
    timer.start();
    gpu.converge_source(1000)?;
    timer.stop();
    timer.record_split("Converging the source on the GPU");

    info!(
        "k-effective: cpu {}, gpu {}",
        cpu.keff().sci(6, 2),
        gpu.keff().sci(6, 2)
    );
    timer.print_splits();
    Ok(())
}
