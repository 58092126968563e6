//! Common supporting utilities for moctools crates
//!
//! These are left public for convenience.
//!
//! Consistent number formatting is useful everywhere results are logged, and
//! every stage of a calculation wants to be timed without reaching for
//! global state.
#![doc = include_str!("../readme.md")]

// Alias for the format! macro
pub use std::format as f;

// Modules
mod timer;
mod value_ext;

// Flatten
pub use timer::Timer;
pub use value_ext::ValueExt;
