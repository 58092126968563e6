//! Cyclic track generation and ray tracing for 2D MOC
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod cache;
mod error;
mod generator;
mod quadrature;
mod track;

#[doc(inline)]
pub use generator::TrackGenerator;

#[doc(inline)]
pub use quadrature::{AzimuthalQuadrature, MAX_TRACKS_PER_ANGLE};

#[doc(inline)]
pub use track::{Segment, Track, TrackEnd, TrackLink};

#[doc(inline)]
pub use error::{Error, Result};
