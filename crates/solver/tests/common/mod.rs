//! Geometries and materials shared by the solver tests
#![allow(dead_code)]

use moctools_geometry::{BoundaryType, Cell, Geometry, Halfspace, Material, Surface};
use moctools_tracks::TrackGenerator;

pub const HALF_PITCH: f64 = 0.63;
pub const RADIUS: f64 = 0.4;

/// Two group fuel, fission neutrons are born fast
pub fn fuel(id: u32) -> Material {
    Material {
        id,
        name: "fuel".into(),
        sigma_t: vec![0.40, 0.95],
        sigma_a: vec![0.015, 0.10],
        sigma_f: vec![0.004, 0.074],
        nu_sigma_f: vec![0.01, 0.18],
        chi: vec![1.0, 0.0],
        sigma_s: vec![0.37, 0.015, 0.0, 0.85],
    }
}

/// Two group moderator without upscatter
pub fn water(id: u32) -> Material {
    Material {
        id,
        name: "water".into(),
        sigma_t: vec![0.60, 2.00],
        sigma_a: vec![0.001, 0.02],
        sigma_s: vec![0.55, 0.049, 0.0, 1.98],
        ..Default::default()
    }
}

/// Pure absorber in one group
pub fn absorber(id: u32, sigma_t: f64) -> Material {
    Material {
        id,
        sigma_t: vec![sigma_t],
        sigma_a: vec![sigma_t],
        ..Default::default()
    }
}

/// Boundary planes of a square `[lo, hi]^2`, bounding `cell` from inside
fn bound_square(geometry: &mut Geometry, cell: &mut Cell, lo: f64, hi: f64, boundary: BoundaryType) {
    let mut planes = [
        Surface::x_plane(101, lo),
        Surface::x_plane(102, hi),
        Surface::y_plane(103, lo),
        Surface::y_plane(104, hi),
    ];

    for (i, plane) in planes.iter_mut().enumerate() {
        plane.set_boundary_type(boundary);
        let side = match i % 2 {
            0 => Halfspace::Positive,
            _ => Halfspace::Negative,
        };
        cell.add_surface(side, plane);
        geometry.add_surface(*plane).unwrap();
    }
}

/// Single region square of side `size` filled with `material`
pub fn homogeneous_box(material: Material, size: f64, boundary: BoundaryType) -> Geometry {
    let mut geometry = Geometry::new();
    let mut cell = Cell::material(1, 0, material.id);
    geometry.add_material(material).unwrap();
    bound_square(&mut geometry, &mut cell, 0.0, size, boundary);
    geometry.add_cell(cell).unwrap();
    geometry.initialize_flat_source_regions().unwrap();
    geometry
}

/// Fuel pin in water, FSR 0 is the fuel and FSR 1 the moderator
pub fn pin_cell(boundary: BoundaryType) -> Geometry {
    let mut geometry = Geometry::new();
    geometry.add_material(fuel(1)).unwrap();
    geometry.add_material(water(2)).unwrap();

    let circle = Surface::circle(1, 0.0, 0.0, RADIUS);
    let mut pin = Cell::material(1, 0, 1);
    pin.add_surface(Halfspace::Negative, &circle);
    let mut moderator = Cell::material(2, 0, 2);
    moderator.add_surface(Halfspace::Positive, &circle);

    bound_square(&mut geometry, &mut moderator, -HALF_PITCH, HALF_PITCH, boundary);
    geometry.add_surface(circle).unwrap();
    geometry.add_cell(pin).unwrap();
    geometry.add_cell(moderator).unwrap();
    geometry.initialize_flat_source_regions().unwrap();
    geometry
}

pub fn generate(geometry: &Geometry, num_azim: usize, spacing: f64) -> TrackGenerator<'_> {
    let mut generator = TrackGenerator::new(geometry, num_azim, spacing).unwrap();
    generator.disable_progress();
    generator.generate_tracks().unwrap();
    generator
}
