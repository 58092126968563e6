//! Constructive solid geometry for 2D method of characteristics
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod cell;
mod error;
mod geometry;
mod lattice;
mod material;
mod point;
mod surface;

#[doc(inline)]
pub use cell::{Cell, CellId, Fill, Sector, UniverseId};

#[doc(inline)]
pub use geometry::{Bounds, FlatSourceRegion, Geometry, Location, Side, ROOT_UNIVERSE};

#[doc(inline)]
pub use lattice::Lattice;

#[doc(inline)]
pub use material::{Material, MaterialId};

#[doc(inline)]
pub use point::{Direction, Point};

#[doc(inline)]
pub use surface::{BoundaryType, Halfspace, Surface, SurfaceId, SurfaceKind};

#[doc(inline)]
pub use error::{Error, Result};
