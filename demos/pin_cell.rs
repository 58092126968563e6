//! Eigenvalue of a single reflected fuel pin
//!
//! The fuel is split into 3 equal-area rings and every region into 8
//! sectors, as a production pin cell model would be.

mod materials;

use moctools::geometry::{BoundaryType, Cell, Geometry, Halfspace, Surface};
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

    let mut timer = Timer::new();
    timer.start();

    let mut geometry = Geometry::new();
    geometry.add_material(materials::uo2(1))?;
    geometry.add_material(materials::water(2))?;

    let mut planes = [
        Surface::x_plane(1, -0.63),
        Surface::x_plane(2, 0.63),
        Surface::y_plane(3, -0.63),
        Surface::y_plane(4, 0.63),
    ];
    let circles = [
        Surface::circle(5, 0.0, 0.0, 0.54),
        Surface::circle(6, 0.0, 0.0, 0.58),
        Surface::circle(7, 0.0, 0.0, 0.62),
    ];

    let mut fuel = Cell::material(1, 0, 1);
    fuel.add_surface(Halfspace::Negative, &circles[0]);
    fuel.set_rings(3);
    fuel.set_sectors(8);
    geometry.add_cell(fuel)?;

    // water annuli between the circles, then the corners
    for (i, pair) in circles.windows(2).enumerate() {
        let mut annulus = Cell::material(2 + i as u32, 0, 2);
        annulus.add_surface(Halfspace::Positive, &pair[0]);
        annulus.add_surface(Halfspace::Negative, &pair[1]);
        annulus.set_sectors(8);
        geometry.add_cell(annulus)?;
    }

    let mut corners = Cell::material(4, 0, 2);
    corners.add_surface(Halfspace::Positive, &circles[2]);
    for (i, plane) in planes.iter_mut().enumerate() {
        plane.set_boundary_type(BoundaryType::Reflective);
        let side = match i % 2 {
            0 => Halfspace::Positive,
            _ => Halfspace::Negative,
        };
        corners.add_surface(side, plane);
    }
    corners.set_sectors(8);
    geometry.add_cell(corners)?;

    for surface in planes.iter().chain(circles.iter()) {
        geometry.add_surface(*surface)?;
    }
    geometry.initialize_flat_source_regions()?;
    info!("Pin cell has {} flat source regions", geometry.num_fsrs());

    timer.stop();
    timer.record_split("Building the geometry");
    timer.reset();

    timer.start();
    let mut generator = TrackGenerator::new(&geometry, 32, 0.05)?;
    generator.set_cache_directory(std::env::temp_dir());
    generator.generate_tracks()?;
    timer.stop();
    timer.record_split("Generating tracks");
    timer.reset();

    let mut solver = Solver::new(&geometry, &generator)?;
    solver.set_num_threads(2)?;
    solver.set_source_convergence_threshold(1e-6)?;

    timer.start();
    let convergence = solver.converge_source(1000)?;
    timer.stop();
    timer.record_split("Fixed source iteration");

    info!("k-effective = {}", convergence.keff.sci(6, 2));
    for (fsr, rate) in solver.fission_rates().iter().enumerate().filter(|(_, r)| **r > 0.0) {
        info!("  fsr {fsr:>3}: fission rate {}", rate.sci(4, 2));
    }

    timer.print_splits();
    solver.timer().print_splits();
    Ok(())
}
