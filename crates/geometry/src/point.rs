//! Positions and directions in the plane

// moctools modules
use moctools_utils::ValueExt;

// external crates
use serde::{Deserialize, Serialize};

/// Cartesian position in cm
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point reached after travelling `distance` along `direction`
    pub fn advance(&self, direction: Direction, distance: f64) -> Self {
        Self {
            x: self.x + direction.ux * distance,
            y: self.y + direction.uy * distance,
        }
    }

    /// The same point expressed relative to `origin`
    pub fn relative_to(&self, origin: Point) -> Self {
        Self {
            x: self.x - origin.x,
            y: self.y - origin.y,
        }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x.sci(5, 2), self.y.sci(5, 2))
    }
}

impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Unit direction vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub ux: f64,
    pub uy: f64,
}

impl Direction {
    /// Direction from an azimuthal angle measured anti-clockwise from +x
    pub fn from_angle(phi: f64) -> Self {
        Self {
            ux: phi.cos(),
            uy: phi.sin(),
        }
    }

    /// The opposite direction
    pub fn reverse(&self) -> Self {
        Self {
            ux: -self.ux,
            uy: -self.uy,
        }
    }
}
