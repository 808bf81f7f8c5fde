//! Immutable, versioned views of the committed graph and solution.

use crate::core::time::Time;

use super::factor::{Factor, Solution};

/// An immutable snapshot of the graph and current solution.
///
/// Handed to output plugins behind an `Arc`; never mutated after
/// publication, so readers hold it without locking. The version increments
/// once per successful optimize cycle; a failed cycle republishes nothing.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    /// Monotone snapshot version (0 = empty, pre-first-cycle).
    pub version: u64,
    /// Time the snapshot was built, from the mapper's time source.
    pub stamp: Time,
    /// All factors merged into the graph so far.
    pub factors: Vec<Factor>,
    /// Solver estimates for every known symbol.
    pub solution: Solution,
}

impl GraphSnapshot {
    /// The empty snapshot published before the first optimize cycle.
    pub fn empty() -> Self {
        Self::default()
    }
}
