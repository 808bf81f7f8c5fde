//! Foundation layer: geometric types, angular math, and time sources.
//!
//! No dependencies on other layers of the crate.

pub mod math;
pub mod time;
pub mod types;
