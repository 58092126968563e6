//! 4 x 4 lattice of fuel pins on four threads, results written as JSON

mod lattice;
mod materials;

use moctools::solver::{Solver, SolverOptions};
use moctools::tracks::TrackGenerator;
use moctools::utils::ValueExt;

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
    info!("Lattice has {} flat source regions", geometry.num_fsrs());

    let mut generator = TrackGenerator::new(&geometry, 16, 0.1)?;
    generator.generate_tracks()?;

    let mut solver = Solver::new(&geometry, &generator)?;
    solver.set_options(SolverOptions {
        num_threads: 4,
        threshold: 1e-5,
        num_polar: 3,
        rebalance: true,
    })?;

    let convergence = solver.converge_source(1000)?;
    info!("k-effective = {}", convergence.keff.sci(6, 2));

    let path = std::env::temp_dir().join("simple-lattice-flux.json");
    solver.write_report(&path)?;

    solver.timer().print_splits();
    Ok(())
}
