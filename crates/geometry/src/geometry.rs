//! Assembled CSG model and flat source region resolution

// crate modules
use crate::cell::{Cell, CellId, Fill, Sector, UniverseId};
use crate::error::{Error, Result};
use crate::lattice::Lattice;
use crate::material::{Material, MaterialId};
use crate::point::{Direction, Point};
use crate::surface::{BoundaryType, Halfspace, Surface, SurfaceId, SurfaceKind};

// standard library
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

// external crates
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Every point search starts in this universe
pub const ROOT_UNIVERSE: UniverseId = 0;

/// Grid resolution used to look for gaps and overlaps at initialisation
const PARTITION_SAMPLES: usize = 64;

/// Ring bounding circles closer than this share a centre
const CENTRE_TOLERANCE: f64 = 1e-12;

/// Side of the rectangular domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

/// Rectangular extent of the domain and its boundary conditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub left: BoundaryType,
    pub right: BoundaryType,
    pub bottom: BoundaryType,
    pub top: BoundaryType,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Boundary condition applied on one side
    pub fn boundary(&self, side: Side) -> BoundaryType {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Top => self.top,
        }
    }
}

/// Leaf region of the geometry with a single material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlatSourceRegion {
    pub material: MaterialId,
    pub cell: CellId,
}

/// One step on the path from the root universe to a material cell
#[derive(Debug, Clone, Copy, PartialEq)]
enum Level {
    /// Cell chosen in a universe, with the point in that universe's frame
    Cell { index: usize, point: Point },
    /// Lattice entry chosen, with the point relative to the entry centre
    Lattice { universe: UniverseId, point: Point },
}

/// Fully resolved position of a point in the geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub fsr: usize,
    pub cell: CellId,
    pub material: MaterialId,
    levels: Vec<Level>,
}

/// Cells of a universe (by arena index), or a lattice
#[derive(Debug, Clone, PartialEq)]
enum Universe {
    Cells(Vec<usize>),
    Lattice(Lattice),
}

/// FSR offsets accumulated while counting regions
#[derive(Debug, Default, Clone)]
struct Offsets {
    cells: Vec<usize>,
    lattices: HashMap<UniverseId, Vec<usize>>,
}

/// Constructive solid geometry model
///
/// Objects are added in any order and only cross-referenced by id when
/// [initialize_flat_source_regions()](Geometry::initialize_flat_source_regions)
/// is called. Initialisation happens once, after which the geometry is
/// read-only and every point of the domain resolves to exactly one flat
/// source region (FSR).
///
/// Within a universe, cells are tested in the order they were added and the
/// first cell containing the point wins.
#[derive(Debug, Default, Clone)]
pub struct Geometry {
    materials: BTreeMap<MaterialId, Material>,
    surfaces: BTreeMap<SurfaceId, Surface>,
    cells: Vec<Cell>,
    cell_ids: HashMap<CellId, usize>,
    universes: BTreeMap<UniverseId, Universe>,

    // everything below is set by initialisation
    initialized: bool,
    num_groups: usize,
    fsrs: Vec<FlatSourceRegion>,
    offsets: Offsets,
    bounds: Option<Bounds>,
    signature: u64,
}

impl Geometry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a material, padding missing fission data with zeros
    pub fn add_material(&mut self, mut material: Material) -> Result<()> {
        self.check_not_initialized()?;
        if self.materials.contains_key(&material.id) {
            return Err(Error::DuplicateMaterial(material.id));
        }
        material.normalise()?;
        self.materials.insert(material.id, material);
        Ok(())
    }

    pub fn add_surface(&mut self, surface: Surface) -> Result<()> {
        self.check_not_initialized()?;
        if self.surfaces.contains_key(&surface.id()) {
            return Err(Error::DuplicateSurface(surface.id()));
        }
        surface.validate()?;
        self.surfaces.insert(surface.id(), surface);
        Ok(())
    }

    /// Add a cell to its universe, creating the universe if needed
    pub fn add_cell(&mut self, cell: Cell) -> Result<()> {
        self.check_not_initialized()?;
        if self.cell_ids.contains_key(&cell.id()) {
            return Err(Error::DuplicateCell(cell.id()));
        }

        let index = self.cells.len();
        match self
            .universes
            .entry(cell.universe())
            .or_insert_with(|| Universe::Cells(Vec::new()))
        {
            Universe::Cells(list) => list.push(index),
            Universe::Lattice(_) => return Err(Error::DuplicateUniverse(cell.universe())),
        }

        self.cell_ids.insert(cell.id(), index);
        self.cells.push(cell);
        Ok(())
    }

    /// Add a lattice, which shares the universe id space
    pub fn add_lattice(&mut self, lattice: Lattice) -> Result<()> {
        self.check_not_initialized()?;
        if self.universes.contains_key(&lattice.id()) {
            return Err(Error::DuplicateUniverse(lattice.id()));
        }
        self.universes
            .insert(lattice.id(), Universe::Lattice(lattice));
        Ok(())
    }

    /// Validate the model and enumerate the flat source regions
    ///
    /// This expands ring and sector subdivisions, checks every reference,
    /// finds the domain boundaries, and samples the domain for gaps and
    /// overlaps. The work happens on a copy of the model, so on failure the
    /// geometry is exactly as it was before the call.
    pub fn initialize_flat_source_regions(&mut self) -> Result<()> {
        self.check_not_initialized()?;

        let mut staged = self.clone();
        staged.build_flat_source_regions()?;
        *self = staged;

        info!(
            "Geometry: {} flat source regions, {} cells, {} energy groups",
            self.fsrs.len(),
            self.cells.len(),
            self.num_groups
        );
        Ok(())
    }

    fn build_flat_source_regions(&mut self) -> Result<()> {
        self.check_references()?;
        self.num_groups = self.check_energy_groups()?;
        self.subdivide_cells();

        let bounds = self.find_bounds()?;

        let mut offsets = Offsets {
            cells: vec![0; self.cells.len()],
            ..Default::default()
        };
        let mut counts = HashMap::new();
        let total = self.count_regions(ROOT_UNIVERSE, &mut counts, &mut offsets, &mut Vec::new())?;

        let mut fsrs = Vec::with_capacity(total);
        self.enumerate_regions(ROOT_UNIVERSE, &mut fsrs);

        self.fsrs = fsrs;
        self.offsets = offsets;
        self.bounds = Some(bounds);
        self.signature = self.compute_signature();
        self.initialized = true;
        self.check_partition(PARTITION_SAMPLES)?;

        debug!(
            "Domain x = [{}, {}], y = [{}, {}]",
            bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
        );
        Ok(())
    }

    /// Resolve a point to its full location
    pub fn locate(&self, point: Point) -> Result<Location> {
        self.resolve(point, false)
    }

    /// Flat source region containing a point
    pub fn find_fsr(&self, point: Point) -> Result<usize> {
        Ok(self.locate(point)?.fsr)
    }

    /// Material at a point
    pub fn find_material(&self, point: Point) -> Result<MaterialId> {
        Ok(self.locate(point)?.material)
    }

    /// Material cell containing a point
    pub fn find_cell(&self, point: Point) -> Result<CellId> {
        Ok(self.locate(point)?.cell)
    }

    /// Distance along a ray to the next crossing of any region boundary
    ///
    /// Considers the surfaces of every cell on the resolution path, the
    /// edges of every lattice cell on the path, and sector edges. Returns
    /// infinity when nothing is ahead.
    pub fn distance_to_boundary(&self, location: &Location, direction: Direction) -> f64 {
        location
            .levels
            .iter()
            .map(|level| match *level {
                Level::Cell { index, point } => {
                    self.cells[index].distance(point, direction, &self.surfaces)
                }
                Level::Lattice { universe, point } => match self.universes.get(&universe) {
                    Some(Universe::Lattice(lattice)) => {
                        lattice.distance_to_cell_edge(point, direction)
                    }
                    _ => f64::INFINITY,
                },
            })
            .fold(f64::INFINITY, f64::min)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn num_fsrs(&self) -> usize {
        self.fsrs.len()
    }

    /// Every FSR, in index order
    pub fn fsrs(&self) -> &[FlatSourceRegion] {
        &self.fsrs
    }

    pub fn fsr(&self, index: usize) -> Option<&FlatSourceRegion> {
        self.fsrs.get(index)
    }

    /// Number of energy groups shared by every material
    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cell_ids.get(&id).map(|i| &self.cells[*i])
    }

    /// Every cell in insertion order, including subdivisions
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn lattice(&self, id: UniverseId) -> Option<&Lattice> {
        match self.universes.get(&id) {
            Some(Universe::Lattice(lattice)) => Some(lattice),
            _ => None,
        }
    }

    /// Extent and boundary conditions of the domain
    pub fn bounds(&self) -> Result<Bounds> {
        self.bounds.ok_or(Error::NotInitialized)
    }

    /// Hash of everything that decides where tracks cross region boundaries
    pub fn signature(&self) -> Result<u64> {
        match self.initialized {
            true => Ok(self.signature),
            false => Err(Error::NotInitialized),
        }
    }

    fn check_not_initialized(&self) -> Result<()> {
        match self.initialized {
            true => Err(Error::AlreadyInitialized),
            false => Ok(()),
        }
    }

    fn check_references(&self) -> Result<()> {
        if self.materials.is_empty() {
            return Err(Error::NoMaterials);
        }
        if !self.universes.contains_key(&ROOT_UNIVERSE) {
            return Err(Error::MissingRootUniverse);
        }

        for cell in &self.cells {
            if let Some((_, surface)) = cell
                .surfaces()
                .iter()
                .find(|(_, id)| !self.surfaces.contains_key(id))
            {
                return Err(Error::UndefinedSurface {
                    cell: cell.id(),
                    surface: *surface,
                });
            }

            match cell.fill() {
                Fill::Material(material) if !self.materials.contains_key(&material) => {
                    return Err(Error::UndefinedMaterial {
                        cell: cell.id(),
                        material,
                    })
                }
                Fill::Universe(universe) if !self.universes.contains_key(&universe) => {
                    return Err(Error::UndefinedUniverse {
                        cell: cell.id(),
                        universe,
                    })
                }
                _ => (),
            }
        }

        for universe in self.universes.values() {
            if let Universe::Lattice(lattice) = universe {
                if let Some(missing) = lattice
                    .universes()
                    .iter()
                    .find(|u| !self.universes.contains_key(*u))
                {
                    return Err(Error::UndefinedLatticeUniverse {
                        lattice: lattice.id(),
                        universe: *missing,
                    });
                }
            }
        }

        Ok(())
    }

    fn check_energy_groups(&self) -> Result<usize> {
        let expected = self
            .materials
            .values()
            .next()
            .map(|m| m.num_groups())
            .ok_or(Error::NoMaterials)?;

        match self.materials.values().find(|m| m.num_groups() != expected) {
            Some(m) => Err(Error::InconsistentEnergyGroups {
                material: m.id,
                expected,
                found: m.num_groups(),
            }),
            None => Ok(expected),
        }
    }

    /// Replace ring/sector cells by their pieces, keeping insertion order
    fn subdivide_cells(&mut self) {
        let mut next_surface = self.surfaces.keys().last().map_or(1, |id| id + 1);
        let mut next_cell = self.cell_ids.keys().max().map_or(1, |id| id + 1);

        let mut cells = Vec::with_capacity(self.cells.len());
        for cell in std::mem::take(&mut self.cells) {
            let split = cell.rings() > 1 || cell.sectors() > 1;
            if !split || !matches!(cell.fill(), Fill::Material(_)) {
                cells.push(cell);
                continue;
            }

            let rings = self.ring_halfspaces(&cell, &mut next_surface);
            let sectors: Vec<Option<Sector>> = match cell.sectors() {
                n if n > 1 => (0..n).map(|k| Some(Sector::nth(k, n))).collect(),
                _ => vec![None],
            };

            let first = cells.len();
            for extra in &rings {
                for sector in &sectors {
                    let id = if cells.len() == first {
                        cell.id()
                    } else {
                        next_cell += 1;
                        next_cell - 1
                    };
                    cells.push(cell.subdivision(id, extra, *sector));
                }
            }
            debug!(
                "Cell {} split into {} regions",
                cell.id(),
                cells.len() - first
            );
        }

        // rebuild the id lookup and universe membership
        self.cell_ids = cells.iter().enumerate().map(|(i, c)| (c.id(), i)).collect();
        for universe in self.universes.values_mut() {
            if let Universe::Cells(list) = universe {
                list.clear();
            }
        }
        for (i, cell) in cells.iter().enumerate() {
            if let Some(Universe::Cells(list)) = self.universes.get_mut(&cell.universe()) {
                list.push(i);
            }
        }
        self.cells = cells;
    }

    /// Extra halfspaces bounding each equal-area ring of a cell, innermost
    /// first
    ///
    /// New circle surfaces are added to the geometry for the ring radii.
    fn ring_halfspaces(
        &mut self,
        cell: &Cell,
        next_surface: &mut SurfaceId,
    ) -> Vec<Vec<(Halfspace, SurfaceId)>> {
        let rings = cell.rings();
        if rings < 2 {
            return vec![Vec::new()];
        }

        let circles = |side: Halfspace| {
            cell.surfaces()
                .iter()
                .filter(move |(h, _)| *h == side)
                .filter_map(|(_, id)| self.surfaces.get(id))
                .filter_map(|s| s.as_circle())
                .collect::<Vec<_>>()
        };

        let Some((centre, r_out)) = circles(Halfspace::Negative)
            .into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
        else {
            warn!(
                "Cell {} has no bounding circle, {} rings ignored",
                cell.id(),
                rings
            );
            return vec![Vec::new()];
        };

        let r_in = circles(Halfspace::Positive)
            .into_iter()
            .filter(|(c, r)| c.distance_to(centre) < CENTRE_TOLERANCE && *r < r_out)
            .map(|(_, r)| r)
            .fold(0.0, f64::max);

        let area = (r_out * r_out - r_in * r_in) / rings as f64;
        let ids: Vec<SurfaceId> = (1..rings)
            .map(|k| {
                let radius = (r_in * r_in + k as f64 * area).sqrt();
                let id = *next_surface;
                *next_surface += 1;
                self.surfaces
                    .insert(id, Surface::circle(id, centre.x, centre.y, radius));
                id
            })
            .collect();

        (0..rings)
            .map(|k| {
                let mut extra = Vec::with_capacity(2);
                if k > 0 {
                    extra.push((Halfspace::Positive, ids[k - 1]));
                }
                if k < rings - 1 {
                    extra.push((Halfspace::Negative, ids[k]));
                }
                extra
            })
            .collect()
    }

    /// Domain extent from the x- and y-planes carrying boundary conditions
    fn find_bounds(&self) -> Result<Bounds> {
        let mut xs = Vec::new();
        let mut ys = Vec::new();

        for surface in self.surfaces.values() {
            let boundary = surface.boundary_type();
            if !boundary.is_boundary() {
                continue;
            }
            match *surface.kind() {
                SurfaceKind::XPlane { x } => xs.push((x, boundary)),
                SurfaceKind::YPlane { y } => ys.push((y, boundary)),
                _ => return Err(Error::UnsupportedBoundarySurface(surface.id())),
            }
        }

        let [(x_min, left), (x_max, right)] = sorted_pair(xs, 'x')?;
        let [(y_min, bottom), (y_max, top)] = sorted_pair(ys, 'y')?;

        if (left == BoundaryType::Periodic) != (right == BoundaryType::Periodic) {
            return Err(Error::InconsistentPeriodicBoundary('x'));
        }
        if (bottom == BoundaryType::Periodic) != (top == BoundaryType::Periodic) {
            return Err(Error::InconsistentPeriodicBoundary('y'));
        }

        Ok(Bounds {
            x_min,
            x_max,
            y_min,
            y_max,
            left,
            right,
            bottom,
            top,
        })
    }

    /// Count FSRs below a universe, recording the offset of each child
    fn count_regions(
        &self,
        id: UniverseId,
        counts: &mut HashMap<UniverseId, usize>,
        offsets: &mut Offsets,
        stack: &mut Vec<UniverseId>,
    ) -> Result<usize> {
        if let Some(count) = counts.get(&id) {
            return Ok(*count);
        }
        if stack.contains(&id) {
            return Err(Error::CircularFill(id));
        }
        stack.push(id);

        let mut total = 0;
        match self.universes.get(&id) {
            Some(Universe::Cells(list)) => {
                for &index in list {
                    offsets.cells[index] = total;
                    total += match self.cells[index].fill() {
                        Fill::Material(_) => 1,
                        Fill::Universe(child) => self.count_regions(child, counts, offsets, stack)?,
                    };
                }
            }
            Some(Universe::Lattice(lattice)) => {
                let mut entries = Vec::with_capacity(lattice.universes().len());
                for &child in lattice.universes() {
                    entries.push(total);
                    total += self.count_regions(child, counts, offsets, stack)?;
                }
                offsets.lattices.insert(id, entries);
            }
            None => return Err(Error::MissingRootUniverse),
        }

        stack.pop();
        counts.insert(id, total);
        Ok(total)
    }

    /// Depth-first listing of leaf regions, matching the counted offsets
    fn enumerate_regions(&self, id: UniverseId, fsrs: &mut Vec<FlatSourceRegion>) {
        match self.universes.get(&id) {
            Some(Universe::Cells(list)) => {
                for &index in list {
                    let cell = &self.cells[index];
                    match cell.fill() {
                        Fill::Material(material) => fsrs.push(FlatSourceRegion {
                            material,
                            cell: cell.id(),
                        }),
                        Fill::Universe(child) => self.enumerate_regions(child, fsrs),
                    }
                }
            }
            Some(Universe::Lattice(lattice)) => {
                for &child in lattice.universes() {
                    self.enumerate_regions(child, fsrs);
                }
            }
            None => (),
        }
    }

    /// Walk from the root universe down to a material cell
    ///
    /// In strict mode every universe on the path is checked for a second
    /// containing cell.
    fn resolve(&self, point: Point, strict: bool) -> Result<Location> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }

        let outside = || Error::PointOutsideGeometry {
            x: point.x,
            y: point.y,
        };

        let mut levels = Vec::new();
        let mut universe = ROOT_UNIVERSE;
        let mut local = point;
        let mut fsr = 0;

        loop {
            match self.universes.get(&universe) {
                Some(Universe::Cells(list)) => {
                    let index = self.find_cell_index(universe, list, local, point, strict)?;
                    let cell = &self.cells[index];
                    fsr += self.offsets.cells[index];
                    levels.push(Level::Cell {
                        index,
                        point: local,
                    });

                    match cell.fill() {
                        Fill::Material(material) => {
                            return Ok(Location {
                                fsr,
                                cell: cell.id(),
                                material,
                                levels,
                            })
                        }
                        Fill::Universe(child) => universe = child,
                    }
                }
                Some(Universe::Lattice(lattice)) => {
                    let (i, j) = lattice.find_index(local).ok_or_else(outside)?;
                    fsr += self
                        .offsets
                        .lattices
                        .get(&universe)
                        .map_or(0, |o| o[lattice.flat_index(i, j)]);
                    local = lattice.local_point(local, i, j);
                    levels.push(Level::Lattice {
                        universe,
                        point: local,
                    });
                    universe = lattice.universe(i, j);
                }
                None => return Err(outside()),
            }
        }
    }

    fn find_cell_index(
        &self,
        universe: UniverseId,
        list: &[usize],
        local: Point,
        point: Point,
        strict: bool,
    ) -> Result<usize> {
        let mut matches = list
            .iter()
            .copied()
            .filter(|&i| self.cells[i].contains(local, &self.surfaces));

        let Some(first) = matches.next() else {
            return Err(match strict || universe != ROOT_UNIVERSE {
                true => Error::Gap {
                    universe,
                    x: point.x,
                    y: point.y,
                },
                false => Error::PointOutsideGeometry {
                    x: point.x,
                    y: point.y,
                },
            });
        };

        if strict {
            if let Some(second) = matches.next() {
                return Err(Error::Overlap {
                    universe,
                    first: self.cells[first].id(),
                    second: self.cells[second].id(),
                    x: point.x,
                    y: point.y,
                });
            }
        }

        Ok(first)
    }

    /// Resolve a regular grid of sample points, failing on gaps or overlaps
    fn check_partition(&self, samples: usize) -> Result<()> {
        let bounds = self.bounds()?;
        let dx = bounds.width() / samples as f64;
        let dy = bounds.height() / samples as f64;

        for j in 0..samples {
            for i in 0..samples {
                let point = Point::new(
                    bounds.x_min + (i as f64 + 0.5) * dx,
                    bounds.y_min + (j as f64 + 0.5) * dy,
                );
                self.resolve(point, true)?;
            }
        }
        Ok(())
    }

    fn compute_signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        for surface in self.surfaces.values() {
            surface.id().hash(&mut hasher);
            surface.boundary_type().hash(&mut hasher);
            let values = match *surface.kind() {
                SurfaceKind::Plane { a, b, c } => vec![0.0, a, b, c],
                SurfaceKind::XPlane { x } => vec![1.0, x],
                SurfaceKind::YPlane { y } => vec![2.0, y],
                SurfaceKind::Circle { x, y, radius } => vec![3.0, x, y, radius],
            };
            values.iter().for_each(|v| v.to_bits().hash(&mut hasher));
        }

        for cell in &self.cells {
            cell.id().hash(&mut hasher);
            cell.universe().hash(&mut hasher);
            cell.fill().hash(&mut hasher);
            cell.surfaces().hash(&mut hasher);
            if let Some(sector) = cell.sector() {
                sector.start.to_bits().hash(&mut hasher);
                sector.end.to_bits().hash(&mut hasher);
            }
        }

        for universe in self.universes.values() {
            if let Universe::Lattice(lattice) = universe {
                lattice.id().hash(&mut hasher);
                lattice.width_x().to_bits().hash(&mut hasher);
                lattice.width_y().to_bits().hash(&mut hasher);
                lattice.num_x().hash(&mut hasher);
                lattice.universes().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}

/// Exactly two distinct boundary planes along one axis, lowest first
fn sorted_pair(
    mut planes: Vec<(f64, BoundaryType)>,
    axis: char,
) -> Result<[(f64, BoundaryType); 2]> {
    planes.sort_by(|a, b| a.0.total_cmp(&b.0));
    match planes[..] {
        [low, high] if low.0 < high.0 => Ok([low, high]),
        [_, _] => Err(Error::MissingBoundary { axis, found: 1 }),
        _ => Err(Error::MissingBoundary {
            axis,
            found: planes.len(),
        }),
    }
}
