//! 4 x 4 lattice of three pin types in a reflective box

use moctools::geometry::{
    BoundaryType, Cell, Geometry, Halfspace, Lattice, Result, Surface,
};

use crate::materials::{uo2, water};

pub fn simple_lattice() -> Result<Geometry> {
    let mut geometry = Geometry::new();
    geometry.add_material(uo2(1))?;
    geometry.add_material(water(2))?;

    let mut planes = [
        Surface::x_plane(1, -2.0),
        Surface::x_plane(2, 2.0),
        Surface::y_plane(3, -2.0),
        Surface::y_plane(4, 2.0),
    ];
    for plane in planes.iter_mut() {
        plane.set_boundary_type(BoundaryType::Reflective);
        geometry.add_surface(*plane)?;
    }

    // pins of universes 1, 2 and 3 shrink in radius
    for (universe, radius) in [(1, 0.4), (2, 0.3), (3, 0.2)] {
        let circle = Surface::circle(4 + universe, 0.0, 0.0, radius);
        geometry.add_surface(circle)?;

        let mut fuel = Cell::material(2 * universe - 1, universe, 1);
        fuel.add_surface(Halfspace::Negative, &circle);
        let mut moderator = Cell::material(2 * universe, universe, 2);
        moderator.add_surface(Halfspace::Positive, &circle);

        geometry.add_cell(fuel)?;
        geometry.add_cell(moderator)?;
    }

    let mut root = Cell::fill_with(7, 0, 5);
    root.add_surface(Halfspace::Positive, &planes[0]);
    root.add_surface(Halfspace::Negative, &planes[1]);
    root.add_surface(Halfspace::Positive, &planes[2]);
    root.add_surface(Halfspace::Negative, &planes[3]);
    geometry.add_cell(root)?;

    geometry.add_lattice(Lattice::new(
        5,
        1.0,
        1.0,
        &[
            vec![1, 2, 1, 2],
            vec![2, 3, 2, 3],
            vec![1, 2, 1, 2],
            vec![2, 3, 2, 3],
        ],
    )?)?;

    geometry.initialize_flat_source_regions()?;
    Ok(geometry)
}
