//! Boundary flux hand-over, cancellation and solver outputs

mod common;

use common::{absorber, generate, homogeneous_box, pin_cell};
use moctools_geometry::BoundaryType;
use moctools_solver::{ConvergenceStatus, Error, FluxReport, Solver};
use rstest::rstest;

#[rstest]
#[case(BoundaryType::Reflective)]
#[case(BoundaryType::Periodic)]
fn outgoing_flux_enters_the_linked_track(#[case] boundary: BoundaryType) {
    let geometry = pin_cell(boundary);
    let generator = generate(&geometry, 8, 0.1);
    let mut solver = Solver::new(&geometry, &generator).unwrap();
    solver.converge_source(500).unwrap();

    let mut checked = 0;
    for track in generator.tracks() {
        for forward in [true, false] {
            let link = track.outgoing(forward).unwrap();
            let outgoing = solver.outgoing_flux(track.uid, forward).unwrap();
            let incoming = solver.incoming_flux(link.track, link.forward).unwrap();

            assert_eq!(outgoing, incoming);
            assert!(outgoing.iter().all(|psi| *psi > 0.0));
            checked += 1;
        }
    }
    assert_eq!(checked, 2 * generator.num_tracks());
}

#[rstest]
fn vacuum_boundaries_let_nothing_in() {
    let geometry = pin_cell(BoundaryType::Vacuum);
    let generator = generate(&geometry, 8, 0.1);
    let mut solver = Solver::new(&geometry, &generator).unwrap();
    solver.converge_source(500).unwrap();

    for track in 0..generator.num_tracks() {
        for forward in [true, false] {
            let incoming = solver.incoming_flux(track, forward).unwrap();
            assert!(incoming.iter().all(|psi| *psi == 0.0));
        }
    }

    assert!(solver.incoming_flux(generator.num_tracks(), true).is_none());
}

#[rstest]
fn leakage_lowers_the_eigenvalue() {
    let k = [BoundaryType::Reflective, BoundaryType::Vacuum].map(|boundary| {
        let geometry = pin_cell(boundary);
        let generator = generate(&geometry, 8, 0.1);
        let mut solver = Solver::new(&geometry, &generator).unwrap();
        solver.converge_source(500).unwrap().keff
    });

    assert!(k[1] < k[0]);
}

#[rstest]
fn cancelled_before_the_first_iteration() {
    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = generate(&geometry, 8, 0.1);
    let mut solver = Solver::new(&geometry, &generator).unwrap();

    let flag = solver.cancel_flag();
    flag.cancel();
    let convergence = solver.converge_source(100).unwrap();
    assert_eq!(convergence.status, ConvergenceStatus::Cancelled);
    assert_eq!(convergence.iterations, 0);

    flag.reset();
    let convergence = solver.converge_source(1000).unwrap();
    assert_eq!(convergence.status, ConvergenceStatus::Converged);
}

#[rstest]
fn cancelling_keeps_the_previous_results() {
    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = generate(&geometry, 8, 0.1);
    let mut solver = Solver::new(&geometry, &generator).unwrap();

    let converged = solver.converge_source(500).unwrap();
    assert!(converged.is_converged());
    let flux = solver.scalar_flux().to_vec();
    let outgoing = solver.outgoing_flux(0, true).unwrap().to_vec();
    let iterations = solver.keff_history().len();

    solver.cancel_flag().cancel();
    let cancelled = solver.converge_source(500).unwrap();
    assert_eq!(cancelled.status, ConvergenceStatus::Cancelled);
    assert_eq!(cancelled.iterations, 0);
    assert_eq!(cancelled.keff, converged.keff);
    assert_eq!(cancelled.residual, converged.residual);

    assert_eq!(solver.keff(), converged.keff);
    assert_eq!(solver.scalar_flux(), flux.as_slice());
    assert_eq!(solver.outgoing_flux(0, true).unwrap(), outgoing.as_slice());
    assert_eq!(solver.keff_history().len(), iterations);
    assert_eq!(solver.convergence(), Some(converged));
}

#[rstest]
fn running_out_of_iterations_is_not_an_error() {
    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = generate(&geometry, 8, 0.1);
    let mut solver = Solver::new(&geometry, &generator).unwrap();

    let convergence = solver.converge_source(0).unwrap();
    assert_eq!(convergence.status, ConvergenceStatus::NotConverged);
    assert_eq!(convergence.iterations, 0);

    let convergence = solver.converge_source(3).unwrap();
    assert_eq!(convergence.status, ConvergenceStatus::NotConverged);
    assert_eq!(convergence.iterations, 3);
    assert_eq!(solver.residual_history().len(), 3);
}

#[rstest]
fn tracks_must_match_the_geometry() {
    let pin = pin_cell(BoundaryType::Reflective);
    let other = homogeneous_box(absorber(1, 1.0), 1.0, BoundaryType::Vacuum);
    let generator = generate(&other, 8, 0.1);

    assert!(matches!(
        Solver::new(&pin, &generator),
        Err(Error::GeometryMismatch)
    ));
}

#[rstest]
fn tracks_must_be_generated() {
    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = moctools_tracks::TrackGenerator::new(&geometry, 8, 0.1).unwrap();

    assert!(matches!(
        Solver::new(&geometry, &generator),
        Err(Error::TracksNotGenerated)
    ));
}

#[rstest]
fn solver_records_timer_splits() {
    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = generate(&geometry, 8, 0.1);
    let mut solver = Solver::new(&geometry, &generator).unwrap();
    solver.converge_source(100).unwrap();

    let timer = solver.timer();
    assert!(!timer.is_running());
    assert!(timer.split("Preparing the transport sweep").is_some());
    assert!(timer.split("Converging the source").unwrap() > 0.0);
}

#[rstest]
fn flux_report_round_trips_through_json() {
    let geometry = pin_cell(BoundaryType::Reflective);
    let generator = generate(&geometry, 8, 0.1);
    let mut solver = Solver::new(&geometry, &generator).unwrap();
    solver.converge_source(500).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flux.json");
    solver.write_report(&path).unwrap();

    let report = FluxReport::read(&path).unwrap();
    assert!((report.keff - solver.keff()).abs() < 1e-12);
    assert_eq!(report.sweep, "cpu");
    assert_eq!(report.regions.len(), 2);
    assert_eq!(report.regions[0].material, 1);
    assert_eq!(report.regions[1].flux.len(), 2);
    assert!(report.convergence.unwrap().is_converged());
}
