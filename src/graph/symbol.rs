//! Graph symbols: namespaced variable identifiers.
//!
//! A symbol is a one-character namespace tag plus a monotonically
//! increasing index, e.g. `x12` for the 13th pose, `l3` for a landmark,
//! `w0` for a wall. Pose symbols are allocated by the mapper's time index;
//! landmark and wall symbols are allocated by the observing plugins in
//! their own namespaces.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace tag for pose symbols.
pub const POSE_TAG: char = 'x';
/// Namespace tag for point-landmark symbols.
pub const LANDMARK_TAG: char = 'l';
/// Namespace tag for wall symbols.
pub const WALL_TAG: char = 'w';

/// A namespaced graph variable identifier.
///
/// Ordering is by tag, then index, which for pose symbols coincides with
/// allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    tag: char,
    index: u64,
}

impl Symbol {
    /// Create a symbol in an arbitrary namespace.
    pub fn new(tag: char, index: u64) -> Self {
        Self { tag, index }
    }

    /// Pose symbol `x<index>`.
    pub fn pose(index: u64) -> Self {
        Self::new(POSE_TAG, index)
    }

    /// Landmark symbol `l<index>`.
    pub fn landmark(index: u64) -> Self {
        Self::new(LANDMARK_TAG, index)
    }

    /// Wall symbol `w<index>`.
    pub fn wall(index: u64) -> Self {
        Self::new(WALL_TAG, index)
    }

    /// Namespace tag.
    pub fn tag(&self) -> char {
        self.tag
    }

    /// Index within the namespace.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Whether this is a pose symbol.
    pub fn is_pose(&self) -> bool {
        self.tag == POSE_TAG
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Symbol::pose(12).to_string(), "x12");
        assert_eq!(Symbol::landmark(3).to_string(), "l3");
        assert_eq!(Symbol::wall(0).to_string(), "w0");
    }

    #[test]
    fn test_ordering_by_tag_then_index() {
        assert!(Symbol::landmark(99) < Symbol::wall(0));
        assert!(Symbol::pose(1) < Symbol::pose(2));
    }

    #[test]
    fn test_is_pose() {
        assert!(Symbol::pose(0).is_pose());
        assert!(!Symbol::landmark(0).is_pose());
    }
}
