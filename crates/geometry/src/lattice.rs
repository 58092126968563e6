//! Regular arrays of universes

// crate modules
use crate::cell::UniverseId;
use crate::error::{Error, Result};
use crate::point::{Direction, Point};

// external crates
use serde::{Deserialize, Serialize};

/// Points this close outside the outer edge are clamped into the lattice
const EDGE_TOLERANCE: f64 = 1e-9;

/// Regular 2D array of universes with a fixed pitch
///
/// The lattice is centred on the local origin of whatever cell it fills.
/// Rows are given top row first, exactly as they would be written out in
/// an input deck, and stored internally from the bottom up so that index
/// `(i, j)` increases with x and y.
///
/// ```rust
/// # use moctools_geometry::{Lattice, Point};
/// let lattice = Lattice::new(10, 1.0, 1.0, &[
///     vec![1, 2],
///     vec![3, 4],
/// ]).unwrap();
///
/// // bottom-left is the first entry of the last row
/// assert_eq!(lattice.universe(0, 0), 3);
/// assert_eq!(lattice.find_index(Point::new(0.5, 0.5)), Some((1, 1)));
/// assert_eq!(lattice.universe(1, 1), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    id: UniverseId,
    width_x: f64,
    width_y: f64,
    num_x: usize,
    num_y: usize,
    universes: Vec<UniverseId>,
}

impl Lattice {
    /// Build a lattice from rows of universe ids, top row first
    pub fn new(
        id: UniverseId,
        width_x: f64,
        width_y: f64,
        rows: &[Vec<UniverseId>],
    ) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidLattice {
            id,
            reason: reason.to_string(),
        };

        if !(width_x.is_finite() && width_x > 0.0 && width_y.is_finite() && width_y > 0.0) {
            return Err(invalid("pitch must be positive and finite"));
        }

        let num_x = rows.first().map(|r| r.len()).unwrap_or(0);
        if num_x == 0 {
            return Err(invalid("no universes given"));
        }
        if rows.iter().any(|r| r.len() != num_x) {
            return Err(invalid("rows must all be the same length"));
        }

        let universes = rows.iter().rev().flatten().copied().collect();

        Ok(Self {
            id,
            width_x,
            width_y,
            num_x,
            num_y: rows.len(),
            universes,
        })
    }

    pub fn id(&self) -> UniverseId {
        self.id
    }

    pub fn num_x(&self) -> usize {
        self.num_x
    }

    pub fn num_y(&self) -> usize {
        self.num_y
    }

    pub fn width_x(&self) -> f64 {
        self.width_x
    }

    pub fn width_y(&self) -> f64 {
        self.width_y
    }

    /// Universe at column `i` and row `j`, counted from the bottom left
    pub fn universe(&self, i: usize, j: usize) -> UniverseId {
        self.universes[self.flat_index(i, j)]
    }

    /// Every universe id in storage order
    pub fn universes(&self) -> &[UniverseId] {
        &self.universes
    }

    pub(crate) fn flat_index(&self, i: usize, j: usize) -> usize {
        j * self.num_x + i
    }

    /// Lattice cell containing a point in the lattice frame
    ///
    /// Points on an interior edge belong to the cell with the larger index,
    /// points on the outer edge are clamped into the lattice.
    pub fn find_index(&self, point: Point) -> Option<(usize, usize)> {
        let i = axis_index(point.x, self.width_x, self.num_x)?;
        let j = axis_index(point.y, self.width_y, self.num_y)?;
        Some((i, j))
    }

    /// Point relative to the centre of lattice cell `(i, j)`
    pub fn local_point(&self, point: Point, i: usize, j: usize) -> Point {
        point.relative_to(self.cell_centre(i, j))
    }

    /// Centre of lattice cell `(i, j)` in the lattice frame
    pub fn cell_centre(&self, i: usize, j: usize) -> Point {
        Point::new(
            (i as f64 + 0.5 - 0.5 * self.num_x as f64) * self.width_x,
            (j as f64 + 0.5 - 0.5 * self.num_y as f64) * self.width_y,
        )
    }

    /// Distance along a ray to the edge of the lattice cell
    ///
    /// The point is relative to the lattice cell centre.
    pub fn distance_to_cell_edge(&self, point: Point, direction: Direction) -> f64 {
        let to_x = edge_distance(point.x, direction.ux, 0.5 * self.width_x);
        let to_y = edge_distance(point.y, direction.uy, 0.5 * self.width_y);
        to_x.min(to_y)
    }
}

/// Index along one axis of a lattice centred on zero
fn axis_index(value: f64, width: f64, count: usize) -> Option<usize> {
    let lower = -0.5 * count as f64 * width;
    let upper = -lower;
    if value < lower - EDGE_TOLERANCE || value > upper + EDGE_TOLERANCE {
        return None;
    }
    let index = ((value - lower) / width).floor();
    Some((index.max(0.0) as usize).min(count - 1))
}

/// Distance to the box edge at `+-half` ahead of a moving coordinate
fn edge_distance(value: f64, rate: f64, half: f64) -> f64 {
    if rate > 0.0 {
        ((half - value) / rate).max(0.0)
    } else if rate < 0.0 {
        ((-half - value) / rate).max(0.0)
    } else {
        f64::INFINITY
    }
}
