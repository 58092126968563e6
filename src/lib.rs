//! `moctools` is a method of characteristics toolkit for 2D neutron
//! transport
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use moctools_geometry as geometry;

#[doc(inline)]
pub use moctools_tracks as tracks;

#[doc(inline)]
pub use moctools_solver as solver;

#[doc(inline)]
pub use moctools_utils as utils;
