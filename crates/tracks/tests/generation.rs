//! Integration tests for track layout, linking and ray tracing

use moctools_geometry::{BoundaryType, Cell, Geometry, Halfspace, Material, Surface};
use moctools_tracks::{Error, Track, TrackGenerator, TrackLink};
use rstest::{fixture, rstest};
use std::f64::consts::PI;

const HALF_PITCH: f64 = 0.63;
const RADIUS: f64 = 0.4;

/// Pin cell with the same boundary condition on every side
fn pin_cell(boundary: BoundaryType) -> Geometry {
    let mut geometry = Geometry::new();
    for id in [1, 2] {
        geometry
            .add_material(Material {
                id,
                sigma_t: vec![1.0],
                sigma_a: vec![1.0],
                ..Default::default()
            })
            .unwrap();
    }

    let mut planes = [
        Surface::x_plane(1, -HALF_PITCH),
        Surface::x_plane(2, HALF_PITCH),
        Surface::y_plane(3, -HALF_PITCH),
        Surface::y_plane(4, HALF_PITCH),
    ];
    let circle = Surface::circle(5, 0.0, 0.0, RADIUS);

    let mut fuel = Cell::material(1, 0, 1);
    fuel.add_surface(Halfspace::Negative, &circle);
    let mut moderator = Cell::material(2, 0, 2);
    moderator.add_surface(Halfspace::Positive, &circle);

    for (i, plane) in planes.iter_mut().enumerate() {
        plane.set_boundary_type(boundary);
        let side = match i % 2 {
            0 => Halfspace::Positive,
            _ => Halfspace::Negative,
        };
        moderator.add_surface(side, plane);
        geometry.add_surface(*plane).unwrap();
    }
    geometry.add_surface(circle).unwrap();
    geometry.add_cell(fuel).unwrap();
    geometry.add_cell(moderator).unwrap();
    geometry.initialize_flat_source_regions().unwrap();
    geometry
}

#[fixture]
fn reflective() -> Geometry {
    pin_cell(BoundaryType::Reflective)
}

fn generate(geometry: &Geometry, num_azim: usize, spacing: f64) -> TrackGenerator<'_> {
    let mut generator = TrackGenerator::new(geometry, num_azim, spacing).unwrap();
    generator.disable_progress();
    generator.generate_tracks().unwrap();
    generator
}

/// Link followed by flux entering `link` and immediately turning back
fn reverse_of(tracks: &[Track], link: TrackLink) -> Option<TrackLink> {
    let entered = &tracks[link.track];
    match link.forward {
        true => entered.start.link,
        false => entered.end.link,
    }
}

#[rstest]
fn segments_sum_to_track_length(reflective: Geometry) {
    let generator = generate(&reflective, 16, 0.05);
    assert!(generator.num_tracks() > 0);

    for track in generator.tracks() {
        let total: f64 = track.segments.iter().map(|s| s.length).sum();
        assert!(
            (total - track.length()).abs() <= 1e-10 * track.length(),
            "track {} sums to {total}, expected {}",
            track.uid,
            track.length()
        );
        assert!(track.segments.iter().all(|s| s.length > 0.0));
        assert!(track.segments.iter().all(|s| s.fsr < reflective.num_fsrs()));
        // consecutive segments are always in different regions
        assert!(track.segments.windows(2).all(|w| w[0].fsr != w[1].fsr));
    }
}

#[rstest]
fn tracks_through_the_pin_alternate_regions(reflective: Geometry) {
    let generator = generate(&reflective, 8, 0.05);
    let through_pin = generator
        .tracks()
        .iter()
        .filter(|t| t.num_segments() == 3)
        .count();
    assert!(through_pin > 0);

    for track in generator.tracks() {
        let fsrs: Vec<usize> = track.segments.iter().map(|s| s.fsr).collect();
        assert!(fsrs == vec![1] || fsrs == vec![1, 0, 1], "{fsrs:?}");
    }
}

#[rstest]
#[case(0.05, 3e-2)]
#[case(0.01, 1e-2)]
#[case(0.002, 2e-3)]
fn fsr_volumes_converge(reflective: Geometry, #[case] spacing: f64, #[case] tolerance: f64) {
    let generator = generate(&reflective, 16, spacing);
    let volumes = generator.fsr_volumes();

    let box_area = (2.0 * HALF_PITCH) * (2.0 * HALF_PITCH);
    let fuel_area = PI * RADIUS * RADIUS;

    // the rectangle itself is integrated exactly
    assert!((volumes.iter().sum::<f64>() - box_area).abs() < 1e-9);
    assert!((volumes[0] - fuel_area).abs() / fuel_area < tolerance);
    assert!((volumes[1] - (box_area - fuel_area)).abs() / (box_area - fuel_area) < tolerance);
}

#[rstest]
#[case(0, 0.1)]
#[case(6, 0.1)]
#[case(10, 0.1)]
#[case(8, 0.0)]
#[case(8, -0.5)]
#[case(8, f64::NAN)]
#[case(8, f64::INFINITY)]
#[case(8, 1e-9)]
#[case(8, 1e-300)]
fn invalid_parameters_are_rejected(
    reflective: Geometry,
    #[case] num_azim: usize,
    #[case] spacing: f64,
) {
    let result = TrackGenerator::new(&reflective, num_azim, spacing);
    assert!(matches!(
        result,
        Err(Error::InvalidAzimuthalAngles(_)) | Err(Error::InvalidTrackSpacing(_))
    ));
}

#[rstest]
#[case(BoundaryType::Reflective)]
#[case(BoundaryType::Periodic)]
fn links_are_reciprocal(#[case] boundary: BoundaryType) {
    let geometry = pin_cell(boundary);
    let generator = generate(&geometry, 32, 0.07);
    let tracks = generator.tracks();

    for track in tracks {
        // leaving through the end and turning back arrives at our end
        let link = track.end.link.unwrap();
        assert_eq!(
            reverse_of(tracks, link),
            Some(TrackLink {
                track: track.uid,
                forward: false
            })
        );

        let link = track.start.link.unwrap();
        assert_eq!(
            reverse_of(tracks, link),
            Some(TrackLink {
                track: track.uid,
                forward: true
            })
        );
    }
}

#[rstest]
fn links_connect_matching_points(reflective: Geometry) {
    let generator = generate(&reflective, 16, 0.1);
    let quadrature = generator.quadrature();
    let tracks = generator.tracks();

    for track in tracks {
        let link = track.end.link.unwrap();
        let next = &tracks[link.track];
        assert_eq!(next.azim, quadrature.complement(track.azim));

        let entry = match link.forward {
            true => next.start.point,
            false => next.end.point,
        };
        assert!(entry.distance_to(track.end.point) < 1e-9);
    }
}

#[rstest]
fn periodic_links_keep_the_angle() {
    let geometry = pin_cell(BoundaryType::Periodic);
    let generator = generate(&geometry, 8, 0.1);
    for track in generator.tracks() {
        let link = track.end.link.unwrap();
        assert_eq!(generator.tracks()[link.track].azim, track.azim);
        assert!(link.forward);
    }
}

#[rstest]
fn vacuum_ends_have_no_links() {
    let geometry = pin_cell(BoundaryType::Vacuum);
    let generator = generate(&geometry, 8, 0.1);
    for track in generator.tracks() {
        assert!(track.start.link.is_none());
        assert!(track.end.link.is_none());
        assert_eq!(track.end.boundary, BoundaryType::Vacuum);
    }
}

#[rstest]
fn tracks_are_cached(reflective: Geometry) {
    let directory = tempfile::tempdir().unwrap();

    let mut first = TrackGenerator::new(&reflective, 8, 0.1).unwrap();
    first.disable_progress();
    first.set_cache_directory(directory.path());
    first.generate_tracks().unwrap();

    let files = std::fs::read_dir(directory.path()).unwrap().count();
    assert_eq!(files, 1);

    let mut second = TrackGenerator::new(&reflective, 8, 0.1).unwrap();
    second.disable_progress();
    second.set_cache_directory(directory.path());
    second.generate_tracks().unwrap();
    assert_eq!(first.tracks(), second.tracks());
    assert_eq!(first.fsr_volumes(), second.fsr_volumes());

    // different parameters never reuse the file
    let mut third = TrackGenerator::new(&reflective, 8, 0.05).unwrap();
    third.disable_progress();
    third.set_cache_directory(directory.path());
    third.generate_tracks().unwrap();
    assert_ne!(first.num_tracks(), third.num_tracks());
    assert_eq!(std::fs::read_dir(directory.path()).unwrap().count(), 2);
}
