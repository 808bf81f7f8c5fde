//! Graph layer: symbols, factors, the pose chain, and pending work.
//!
//! # Contents
//!
//! - [`Symbol`]: namespaced variable identifiers (`x`, `l`, `w`)
//! - [`TimeSymbolIndex`]: bijective timestamp ↔ pose-symbol mapping
//! - [`PoseChain`]: authoritative pose history with the commit cursor
//! - [`PendingWorkBuffer`]: producer-side factor/value queue
//! - [`GraphSnapshot`]: immutable published view

mod factor;
mod pending;
mod pose_chain;
mod snapshot;
mod symbol;
mod time_index;

pub use factor::{Constraint, Factor, Solution, Value};
pub use pending::{PendingFactor, PendingValue, PendingWorkBuffer};
pub use pose_chain::{PoseChain, PoseNode};
pub use snapshot::GraphSnapshot;
pub use symbol::{Symbol, LANDMARK_TAG, POSE_TAG, WALL_TAG};
pub use time_index::TimeSymbolIndex;
