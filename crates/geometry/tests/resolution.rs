//! Integration tests for point resolution in nested geometries

use moctools_geometry::{
    BoundaryType, Cell, Direction, Error, Geometry, Halfspace, Lattice, Material, Point, Surface,
};
use rstest::{fixture, rstest};

const PITCH: f64 = 1.0;
const RADIUS: f64 = 0.3;

fn material(id: u32) -> Material {
    Material {
        id,
        sigma_t: vec![1.0, 2.0],
        sigma_a: vec![0.1, 0.5],
        sigma_s: vec![0.8, 0.1, 0.0, 1.5],
        ..Default::default()
    }
}

/// 4x4 lattice of pins, material 1 pins with material 2 in the bottom-left
/// corner, all in material 3 moderator
#[fixture]
fn lattice_geometry() -> Geometry {
    let mut geometry = Geometry::new();
    for id in 1..=3 {
        geometry.add_material(material(id)).unwrap();
    }

    let half = 2.0 * PITCH;
    let mut planes = [
        Surface::x_plane(1, -half),
        Surface::x_plane(2, half),
        Surface::y_plane(3, -half),
        Surface::y_plane(4, half),
    ];
    planes
        .iter_mut()
        .for_each(|p| p.set_boundary_type(BoundaryType::Reflective));
    let circle = Surface::circle(5, 0.0, 0.0, RADIUS);
    for surface in planes.iter().chain([&circle]) {
        geometry.add_surface(*surface).unwrap();
    }

    // universe 1 and 2 are pins, the same circle bounds both
    for (universe, fuel) in [(1, 1), (2, 2)] {
        let mut pin = Cell::material(10 * universe, universe, fuel);
        pin.add_surface(Halfspace::Negative, &circle);
        let mut moderator = Cell::material(10 * universe + 1, universe, 3);
        moderator.add_surface(Halfspace::Positive, &circle);
        geometry.add_cell(pin).unwrap();
        geometry.add_cell(moderator).unwrap();
    }

    let lattice = Lattice::new(
        5,
        PITCH,
        PITCH,
        &[
            vec![1, 1, 1, 1],
            vec![1, 1, 1, 1],
            vec![1, 1, 1, 1],
            vec![2, 1, 1, 1],
        ],
    )
    .unwrap();
    geometry.add_lattice(lattice).unwrap();

    let mut root = Cell::fill_with(1, 0, 5);
    root.add_surface(Halfspace::Positive, &planes[0]);
    root.add_surface(Halfspace::Negative, &planes[1]);
    root.add_surface(Halfspace::Positive, &planes[2]);
    root.add_surface(Halfspace::Negative, &planes[3]);
    geometry.add_cell(root).unwrap();

    geometry.initialize_flat_source_regions().unwrap();
    geometry
}

/// Material expected at a point from the pin layout alone
fn expected_material(point: Point) -> u32 {
    let i = ((point.x + 2.0) / PITCH).floor().clamp(0.0, 3.0);
    let j = ((point.y + 2.0) / PITCH).floor().clamp(0.0, 3.0);
    let centre = Point::new(-1.5 + i, -1.5 + j);
    if point.distance_to(centre) < RADIUS {
        if i == 0.0 && j == 0.0 {
            2
        } else {
            1
        }
    } else {
        3
    }
}

#[rstest]
fn every_interior_point_resolves(lattice_geometry: Geometry) {
    assert_eq!(lattice_geometry.num_fsrs(), 32);

    let n = 197;
    for j in 0..n {
        for i in 0..n {
            let point = Point::new(
                -2.0 + 4.0 * (i as f64 + 0.5) / n as f64,
                -2.0 + 4.0 * (j as f64 + 0.5) / n as f64,
            );
            let location = lattice_geometry.locate(point).unwrap();
            assert!(location.fsr < lattice_geometry.num_fsrs());
            assert_eq!(location.material, expected_material(point), "{point}");
            assert_eq!(
                lattice_geometry.fsr(location.fsr).unwrap().material,
                location.material
            );
        }
    }
}

#[rstest]
fn fsr_indices_follow_lattice_order(lattice_geometry: Geometry) {
    // bottom-left pin is the first lattice entry
    assert_eq!(lattice_geometry.find_fsr(Point::new(-1.5, -1.5)).unwrap(), 0);
    assert_eq!(lattice_geometry.find_fsr(Point::new(-1.9, -1.9)).unwrap(), 1);
    // next entry along x
    assert_eq!(lattice_geometry.find_fsr(Point::new(-0.5, -1.5)).unwrap(), 2);
    // top-right pin is the last
    assert_eq!(lattice_geometry.find_fsr(Point::new(1.5, 1.5)).unwrap(), 30);
    assert_eq!(lattice_geometry.find_fsr(Point::new(1.9, 1.9)).unwrap(), 31);
}

#[rstest]
#[case(Point::new(-1.0, -1.5), 3)] // interior x edge goes to the right cell
#[case(Point::new(-1.5, -1.0), 9)] // interior y edge goes to the cell above
#[case(Point::new(-2.0, -2.0), 1)] // lower domain corner
#[case(Point::new(-1.5 + RADIUS, -1.5), 1)] // on the circle is outside it
fn points_on_boundaries(lattice_geometry: Geometry, #[case] point: Point, #[case] fsr: usize) {
    assert_eq!(lattice_geometry.find_fsr(point).unwrap(), fsr);
}

#[rstest]
fn points_outside_the_domain(lattice_geometry: Geometry) {
    assert!(matches!(
        lattice_geometry.find_fsr(Point::new(2.5, 0.0)),
        Err(Error::PointOutsideGeometry { .. })
    ));
    // the upper x-plane itself is on its positive side
    assert!(matches!(
        lattice_geometry.find_fsr(Point::new(2.0, 0.0)),
        Err(Error::PointOutsideGeometry { .. })
    ));
}

#[rstest]
fn distance_stops_at_lattice_edges(lattice_geometry: Geometry) {
    // moderator of the bottom-left pin heading east, the pin edge at x = -1
    // is closer than the next circle
    let location = lattice_geometry.locate(Point::new(-1.9, -1.1)).unwrap();
    let d = lattice_geometry.distance_to_boundary(&location, Direction::from_angle(0.0));
    assert!((d - 0.9).abs() < 1e-12);

    // through the pin centre the circle comes first
    let location = lattice_geometry.locate(Point::new(-1.9, -1.5)).unwrap();
    let d = lattice_geometry.distance_to_boundary(&location, Direction::from_angle(0.0));
    assert!((d - (0.4 - RADIUS)).abs() < 1e-12);
}

#[rstest]
fn lattice_with_missing_universe() {
    let mut geometry = Geometry::new();
    geometry.add_material(material(1)).unwrap();
    let lattice = Lattice::new(5, 1.0, 1.0, &[vec![1, 7]]).unwrap();
    geometry.add_lattice(lattice).unwrap();
    geometry.add_cell(Cell::material(1, 1, 1)).unwrap();
    geometry.add_cell(Cell::fill_with(2, 0, 5)).unwrap();

    assert_eq!(
        geometry.initialize_flat_source_regions(),
        Err(Error::UndefinedLatticeUniverse {
            lattice: 5,
            universe: 7
        })
    );
}
