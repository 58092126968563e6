//! Cells bounded by surface halfspaces

// crate modules
use crate::material::MaterialId;
use crate::point::{Direction, Point};
use crate::surface::{Halfspace, Surface, SurfaceId};

// standard library
use std::collections::BTreeMap;
use std::f64::consts::TAU;

// external crates
use serde::{Deserialize, Serialize};

/// Rays passing this close to the apex hit both wedge edges
const APEX_TOLERANCE: f64 = 1e-12;

/// Unique cell identifier
pub type CellId = u32;

/// Unique universe (or lattice) identifier
pub type UniverseId = u32;

/// What a cell is filled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fill {
    /// Leaf cell, a flat source region
    Material(MaterialId),
    /// Universe or lattice placed in the cell's local frame
    Universe(UniverseId),
}

/// Angular wedge `[start, end)` about the universe origin, in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub start: f64,
    pub end: f64,
}

impl Sector {
    /// Sector `k` of `n` equal wedges
    pub fn nth(k: usize, n: usize) -> Self {
        Self {
            start: TAU * k as f64 / n as f64,
            end: TAU * (k + 1) as f64 / n as f64,
        }
    }

    /// Angle in `[0, 2pi)` contained by the half-open wedge
    ///
    /// The origin has an angle of zero and so belongs to the first sector.
    pub fn contains(&self, point: Point) -> bool {
        let mut angle = point.y.atan2(point.x);
        if angle < 0.0 {
            angle += TAU;
        }
        self.start <= angle && angle < self.end
    }

    /// Distance along a ray to either edge of the wedge
    pub fn distance(&self, point: Point, direction: Direction) -> Option<f64> {
        [self.start, self.end]
            .into_iter()
            .filter_map(|theta| edge_distance(theta, point, direction))
            .min_by(f64::total_cmp)
    }
}

/// Distance to the ray from the origin at angle `theta`
fn edge_distance(theta: f64, point: Point, direction: Direction) -> Option<f64> {
    let (ex, ey) = (theta.cos(), theta.sin());
    let denom = ex * direction.uy - ey * direction.ux;
    if denom == 0.0 {
        return None;
    }
    let t = -(ex * point.y - ey * point.x) / denom;
    if t <= 0.0 {
        return None;
    }
    // only the half-line leaving the origin bounds the wedge
    let hit = point.advance(direction, t);
    (ex * hit.x + ey * hit.y >= -APEX_TOLERANCE).then_some(t)
}

/// Region bounded by the intersection of surface halfspaces
///
/// ```rust
/// # use moctools_geometry::{Cell, Fill, Halfspace, Surface};
/// let fuel = Surface::circle(1, 0.0, 0.0, 0.4);
///
/// let mut cell = Cell::material(10, 1, 100);
/// cell.add_surface(Halfspace::Negative, &fuel);
/// cell.set_rings(3);
///
/// assert_eq!(cell.fill(), Fill::Material(100));
/// assert_eq!(cell.surfaces(), &[(Halfspace::Negative, 1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    id: CellId,
    universe: UniverseId,
    fill: Fill,
    surfaces: Vec<(Halfspace, SurfaceId)>,
    rings: usize,
    sectors: usize,
    sector: Option<Sector>,
}

impl Cell {
    /// Leaf cell containing a material
    pub fn material(id: CellId, universe: UniverseId, material: MaterialId) -> Self {
        Self::new(id, universe, Fill::Material(material))
    }

    /// Cell filled by a universe or lattice
    pub fn fill_with(id: CellId, universe: UniverseId, fill: UniverseId) -> Self {
        Self::new(id, universe, Fill::Universe(fill))
    }

    fn new(id: CellId, universe: UniverseId, fill: Fill) -> Self {
        Self {
            id,
            universe,
            fill,
            surfaces: Vec::new(),
            rings: 0,
            sectors: 0,
            sector: None,
        }
    }

    /// Bound the cell by one side of a surface
    pub fn add_surface(&mut self, halfspace: Halfspace, surface: &Surface) {
        self.surfaces.push((halfspace, surface.id()));
    }

    /// Split a material cell into equal-area annuli at initialisation
    pub fn set_rings(&mut self, rings: usize) {
        self.rings = rings;
    }

    /// Split a material cell into equal angular wedges at initialisation
    pub fn set_sectors(&mut self, sectors: usize) {
        self.sectors = sectors;
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn universe(&self) -> UniverseId {
        self.universe
    }

    pub fn fill(&self) -> Fill {
        self.fill
    }

    pub fn surfaces(&self) -> &[(Halfspace, SurfaceId)] {
        &self.surfaces
    }

    pub fn rings(&self) -> usize {
        self.rings
    }

    pub fn sectors(&self) -> usize {
        self.sectors
    }

    /// Wedge restriction added by sector subdivision
    pub fn sector(&self) -> Option<Sector> {
        self.sector
    }

    /// Does the cell contain the point?
    ///
    /// Surfaces must all exist in `surfaces`, which initialisation checks.
    pub(crate) fn contains(&self, point: Point, surfaces: &BTreeMap<SurfaceId, Surface>) -> bool {
        let inside = self.surfaces.iter().all(|(halfspace, id)| {
            surfaces
                .get(id)
                .is_some_and(|s| s.halfspace(point) == *halfspace)
        });
        inside && self.sector.map_or(true, |s| s.contains(point))
    }

    /// Distance along a ray to the nearest bounding surface or sector edge
    pub(crate) fn distance(
        &self,
        point: Point,
        direction: Direction,
        surfaces: &BTreeMap<SurfaceId, Surface>,
    ) -> f64 {
        let to_surface = self
            .surfaces
            .iter()
            .filter_map(|(_, id)| surfaces.get(id))
            .filter_map(|s| s.distance(point, direction));

        let to_sector = self.sector.and_then(|s| s.distance(point, direction));

        to_surface
            .chain(to_sector)
            .fold(f64::INFINITY, f64::min)
    }

    /// Copy of this cell as one piece of a subdivision
    pub(crate) fn subdivision(
        &self,
        id: CellId,
        extra: &[(Halfspace, SurfaceId)],
        sector: Option<Sector>,
    ) -> Self {
        let mut cell = self.clone();
        cell.id = id;
        cell.surfaces.extend_from_slice(extra);
        cell.rings = 0;
        cell.sectors = 0;
        cell.sector = sector;
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn surfaces(list: &[Surface]) -> BTreeMap<SurfaceId, Surface> {
        list.iter().map(|s| (s.id(), *s)).collect()
    }

    #[test]
    fn annulus_membership() {
        let inner = Surface::circle(1, 0.0, 0.0, 0.5);
        let outer = Surface::circle(2, 0.0, 0.0, 1.0);
        let map = surfaces(&[inner, outer]);

        let mut cell = Cell::material(1, 0, 1);
        cell.add_surface(Halfspace::Positive, &inner);
        cell.add_surface(Halfspace::Negative, &outer);

        assert!(cell.contains(Point::new(0.75, 0.0), &map));
        assert!(cell.contains(Point::new(0.5, 0.0), &map));
        assert!(!cell.contains(Point::new(0.25, 0.0), &map));
        assert!(!cell.contains(Point::new(1.0, 0.0), &map));
    }

    #[test]
    fn sector_edges_belong_anticlockwise() {
        let quarter = Sector::nth(1, 4);
        assert!(quarter.contains(Point::new(0.0, 1.0)));
        assert!(!quarter.contains(Point::new(-1.0, 0.0)));
        assert!(Sector::nth(2, 4).contains(Point::new(-1.0, 0.0)));

        // centre and the positive x axis are in the first sector
        assert!(Sector::nth(0, 4).contains(Point::new(0.0, 0.0)));
        assert!(Sector::nth(0, 4).contains(Point::new(1.0, 0.0)));
        assert!(Sector::nth(3, 4).contains(Point::new(1.0, -1e-12)));
    }

    #[test]
    fn sector_distance_ignores_opposite_half_line() {
        let wedge = Sector { start: 0.0, end: FRAC_PI_2 };
        let point = Point::new(0.5, 0.5);

        // heading west, the edge at pi/2 is crossed after 0.5
        let d = wedge.distance(point, Direction::from_angle(PI)).unwrap();
        assert!((d - 0.5).abs() < 1e-12);

        // heading south-west towards the origin, both edges meet at the apex
        let d = wedge
            .distance(point, Direction::from_angle(1.25 * PI))
            .unwrap();
        assert!((d - 0.5_f64.hypot(0.5)).abs() < 1e-12);

        // heading north-east away from the wedge edges
        assert!(wedge
            .distance(point, Direction::from_angle(0.25 * PI))
            .is_none());
    }

    #[test]
    fn distance_to_nearest_surface() {
        let left = Surface::x_plane(1, -1.0);
        let right = Surface::x_plane(2, 2.0);
        let map = surfaces(&[left, right]);

        let mut cell = Cell::material(1, 0, 1);
        cell.add_surface(Halfspace::Positive, &left);
        cell.add_surface(Halfspace::Negative, &right);

        let d = cell.distance(Point::new(0.0, 0.0), Direction::from_angle(0.0), &map);
        assert!((d - 2.0).abs() < 1e-12);
    }
}
