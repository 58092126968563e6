//! Implicit surfaces and halfspaces

// crate modules
use crate::error::{Error, Result};
use crate::point::{Direction, Point};

// external crates
use serde::{Deserialize, Serialize};

/// Unique surface identifier
pub type SurfaceId = u32;

/// Condition applied where a track leaves the domain through a surface
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryType {
    /// Interior surface, not part of the domain boundary
    #[default]
    Interface,
    /// Outgoing flux is lost
    Vacuum,
    /// Outgoing flux re-enters along the mirrored direction
    Reflective,
    /// Outgoing flux re-enters through the opposite side
    Periodic,
}

impl BoundaryType {
    /// Is this surface part of the domain boundary?
    pub fn is_boundary(&self) -> bool {
        *self != BoundaryType::Interface
    }
}

impl std::fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Interface => "interface",
            Self::Vacuum => "vacuum",
            Self::Reflective => "reflective",
            Self::Periodic => "periodic",
        };
        write!(f, "{s}")
    }
}

/// Side of a surface
///
/// Points with `f(x, y) >= 0` are in the positive halfspace, so a point
/// exactly on a surface is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Halfspace {
    Positive,
    Negative,
}

impl Halfspace {
    /// Halfspace for a value of the surface function
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    /// +1 or -1
    pub fn sign(&self) -> i32 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }
}

impl TryFrom<i32> for Halfspace {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Self::Positive),
            -1 => Ok(Self::Negative),
            _ => Err(Error::InvalidHalfspace(value)),
        }
    }
}

/// Supported surface equations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// `a*x + b*y + c = 0`
    Plane { a: f64, b: f64, c: f64 },
    /// `x - x0 = 0`
    XPlane { x: f64 },
    /// `y - y0 = 0`
    YPlane { y: f64 },
    /// `(x - x0)^2 + (y - y0)^2 - r^2 = 0`
    Circle { x: f64, y: f64, radius: f64 },
}

/// Surface with a unique id and boundary condition
///
/// Cells reference surfaces by id, so the same surface may bound any number
/// of cells.
///
/// ```rust
/// # use moctools_geometry::{Halfspace, Point, Surface};
/// let circle = Surface::circle(1, 0.0, 0.0, 1.0);
/// assert_eq!(circle.halfspace(Point::new(0.0, 0.0)), Halfspace::Negative);
/// assert_eq!(circle.halfspace(Point::new(1.0, 0.0)), Halfspace::Positive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    id: SurfaceId,
    kind: SurfaceKind,
    boundary: BoundaryType,
}

impl Surface {
    /// General plane `a*x + b*y + c = 0`
    pub fn plane(id: SurfaceId, a: f64, b: f64, c: f64) -> Self {
        Self::new(id, SurfaceKind::Plane { a, b, c })
    }

    /// Plane of constant x
    pub fn x_plane(id: SurfaceId, x: f64) -> Self {
        Self::new(id, SurfaceKind::XPlane { x })
    }

    /// Plane of constant y
    pub fn y_plane(id: SurfaceId, y: f64) -> Self {
        Self::new(id, SurfaceKind::YPlane { y })
    }

    /// Circle centred on (x, y)
    pub fn circle(id: SurfaceId, x: f64, y: f64, radius: f64) -> Self {
        Self::new(id, SurfaceKind::Circle { x, y, radius })
    }

    fn new(id: SurfaceId, kind: SurfaceKind) -> Self {
        Self {
            id,
            kind,
            boundary: BoundaryType::default(),
        }
    }

    pub fn set_boundary_type(&mut self, boundary: BoundaryType) {
        self.boundary = boundary;
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn kind(&self) -> &SurfaceKind {
        &self.kind
    }

    pub fn boundary_type(&self) -> BoundaryType {
        self.boundary
    }

    /// Check the surface coefficients describe a real curve
    pub fn validate(&self) -> Result<()> {
        let reason = match self.kind {
            SurfaceKind::Plane { a, b, c } if ![a, b, c].iter().all(|v| v.is_finite()) => {
                "plane coefficients must be finite"
            }
            SurfaceKind::Plane { a, b, .. } if a == 0.0 && b == 0.0 => {
                "plane normal must be non-zero"
            }
            SurfaceKind::XPlane { x } if !x.is_finite() => "x must be finite",
            SurfaceKind::YPlane { y } if !y.is_finite() => "y must be finite",
            SurfaceKind::Circle { x, y, radius }
                if !(x.is_finite() && y.is_finite() && radius.is_finite()) =>
            {
                "circle parameters must be finite"
            }
            SurfaceKind::Circle { radius, .. } if radius <= 0.0 => "radius must be positive",
            _ => return Ok(()),
        };

        Err(Error::InvalidSurface {
            id: self.id,
            reason: reason.to_string(),
        })
    }

    /// Value of the surface function at a point
    pub fn evaluate(&self, point: Point) -> f64 {
        match self.kind {
            SurfaceKind::Plane { a, b, c } => a * point.x + b * point.y + c,
            SurfaceKind::XPlane { x } => point.x - x,
            SurfaceKind::YPlane { y } => point.y - y,
            SurfaceKind::Circle { x, y, radius } => {
                let (dx, dy) = (point.x - x, point.y - y);
                dx * dx + dy * dy - radius * radius
            }
        }
    }

    /// Which side of the surface a point is on
    pub fn halfspace(&self, point: Point) -> Halfspace {
        Halfspace::of(self.evaluate(point))
    }

    /// Distance along a ray to the nearest crossing ahead of the point
    ///
    /// Only strictly positive distances are returned, crossings behind or
    /// exactly at the start of the ray are ignored.
    pub fn distance(&self, point: Point, direction: Direction) -> Option<f64> {
        match self.kind {
            SurfaceKind::Plane { a, b, c } => {
                let denom = a * direction.ux + b * direction.uy;
                plane_crossing(a * point.x + b * point.y + c, denom)
            }
            SurfaceKind::XPlane { x } => plane_crossing(point.x - x, direction.ux),
            SurfaceKind::YPlane { y } => plane_crossing(point.y - y, direction.uy),
            SurfaceKind::Circle { x, y, radius } => {
                let (px, py) = (point.x - x, point.y - y);
                let b = px * direction.ux + py * direction.uy;
                let c = px * px + py * py - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let root = disc.sqrt();
                [-b - root, -b + root].into_iter().find(|t| *t > 0.0)
            }
        }
    }

    /// Centre and radius, if this surface is a circle
    pub fn as_circle(&self) -> Option<(Point, f64)> {
        match self.kind {
            SurfaceKind::Circle { x, y, radius } => Some((Point::new(x, y), radius)),
            _ => None,
        }
    }
}

/// Distance to a linear surface given its value and rate of change
fn plane_crossing(value: f64, rate: f64) -> Option<f64> {
    if rate == 0.0 {
        return None;
    }
    let t = -value / rate;
    (t > 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn halfspace_from_integers() {
        assert_eq!(Halfspace::try_from(1).unwrap(), Halfspace::Positive);
        assert_eq!(Halfspace::try_from(-1).unwrap(), Halfspace::Negative);
        assert_eq!(Halfspace::try_from(0), Err(Error::InvalidHalfspace(0)));
    }

    #[test]
    fn surface_points_are_positive() {
        let plane = Surface::x_plane(1, 2.0);
        assert_eq!(plane.halfspace(Point::new(2.0, 7.0)), Halfspace::Positive);
        assert_eq!(plane.halfspace(Point::new(1.999, 7.0)), Halfspace::Negative);

        let general = Surface::plane(2, 1.0, -1.0, 0.0);
        assert_eq!(general.halfspace(Point::new(3.0, 3.0)), Halfspace::Positive);
    }

    #[test]
    fn circle_crossings() {
        let circle = Surface::circle(1, 0.0, 0.0, 1.0);
        let east = Direction::from_angle(0.0);

        // from outside, the near side is hit first
        let d = circle.distance(Point::new(-3.0, 0.0), east).unwrap();
        assert!((d - 2.0).abs() < 1e-12);

        // from inside, only the far side is ahead
        let d = circle.distance(Point::new(0.0, 0.0), east).unwrap();
        assert!((d - 1.0).abs() < 1e-12);

        // missed entirely, or already behind
        assert!(circle.distance(Point::new(-3.0, 2.0), east).is_none());
        assert!(circle.distance(Point::new(3.0, 0.0), east).is_none());
    }

    #[test]
    fn plane_crossings() {
        let plane = Surface::plane(1, 1.0, 1.0, -2.0);
        let d = plane
            .distance(Point::new(0.0, 0.0), Direction::from_angle(FRAC_PI_4))
            .unwrap();
        assert!((d - 2.0_f64.sqrt()).abs() < 1e-12);

        let parallel = Surface::y_plane(2, 1.0);
        assert!(parallel
            .distance(Point::new(0.0, 0.0), Direction::from_angle(0.0))
            .is_none());
    }

    #[test]
    fn invalid_surfaces() {
        assert!(Surface::circle(1, 0.0, 0.0, 0.0).validate().is_err());
        assert!(Surface::plane(2, 0.0, 0.0, 1.0).validate().is_err());
        assert!(Surface::x_plane(3, f64::NAN).validate().is_err());
        assert!(Surface::circle(4, 0.0, 0.0, 0.5).validate().is_ok());
    }
}
