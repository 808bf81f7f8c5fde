//! The pose chain: the authoritative history of pose nodes.
//!
//! Nodes live in an array-backed arena in allocation order, with a
//! `BTreeMap` over timestamps for temporal traversal. The commit cursor is
//! a plain arena index marking the most recently committed node; it stays
//! valid across tail insertions, unlike a linked-list iterator.

use std::collections::{BTreeMap, HashMap};

use crate::core::time::Time;
use crate::core::types::Pose2D;
use crate::error::{Error, Result};

use super::factor::{Solution, Value};
use super::symbol::Symbol;
use super::time_index::TimeSymbolIndex;

/// A single timestamped pose in the chain.
#[derive(Debug, Clone)]
pub struct PoseNode {
    /// Graph identifier of this pose.
    pub symbol: Symbol,
    /// Timestamp in microseconds.
    pub timestamp: Time,
    /// Best-effort estimate before commit (from the primary pose plugin).
    pub predicted: Option<Pose2D>,
    /// Whether this node has been frozen into the graph.
    pub committed: bool,
    /// Last solver-returned estimate; absent until the first optimization
    /// that includes this node.
    pub optimized: Option<Pose2D>,
}

impl PoseNode {
    /// Best available estimate: optimized if present, else predicted.
    pub fn best_estimate(&self) -> Option<Pose2D> {
        self.optimized.or(self.predicted)
    }
}

/// Ordered sequence of pose nodes, committed and pending.
///
/// Owns the [`TimeSymbolIndex`]; all access is serialized by the mapper's
/// state lock.
#[derive(Debug, Default)]
pub struct PoseChain {
    index: TimeSymbolIndex,
    nodes: Vec<PoseNode>,
    by_symbol: HashMap<Symbol, usize>,
    by_time: BTreeMap<Time, usize>,
    /// Arena index of the most recently committed node, in time order.
    cursor: Option<usize>,
    /// Uncommitted nodes ahead of the cursor (late stragglers excluded).
    uncommitted: usize,
}

impl PoseChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate (or look up) the pose symbol for `t` and append a pending
    /// node for it. Idempotent per timestamp.
    ///
    /// A node stamped earlier than the latest committed node can never be
    /// committed (the solver requires temporal commit order); it is kept
    /// for lookups but skipped by the scheduler.
    pub fn append_pending(&mut self, t: Time) -> Symbol {
        if let Some(sym) = self.index.get(t) {
            return sym;
        }
        let sym = self.index.symbol_for_time(t);
        let idx = self.nodes.len();
        self.nodes.push(PoseNode {
            symbol: sym,
            timestamp: t,
            predicted: None,
            committed: false,
            optimized: None,
        });
        self.by_symbol.insert(sym, idx);
        self.by_time.insert(t, idx);

        let late = self
            .cursor
            .map(|c| t <= self.nodes[c].timestamp)
            .unwrap_or(false);
        if late {
            log::warn!(
                "pose {} at {}us is older than the latest committed node; it will never commit",
                sym,
                t
            );
        } else {
            self.uncommitted += 1;
        }
        sym
    }

    /// Set the predicted pose on an existing uncommitted node.
    pub fn update_prediction(&mut self, sym: Symbol, pose: Pose2D) -> Result<()> {
        let idx = *self
            .by_symbol
            .get(&sym)
            .ok_or_else(|| Error::unknown_symbol(sym))?;
        let node = &mut self.nodes[idx];
        if node.committed {
            return Err(Error::AlreadyCommitted(sym));
        }
        node.predicted = Some(pose);
        Ok(())
    }

    /// Record a solver-returned estimate. Unknown symbols are ignored (the
    /// solution also carries landmark/wall symbols the chain doesn't own).
    pub fn set_optimized(&mut self, sym: Symbol, pose: Pose2D) {
        if let Some(&idx) = self.by_symbol.get(&sym) {
            self.nodes[idx].optimized = Some(pose);
        }
    }

    /// Earliest-in-time uncommitted node strictly older than `cutoff`,
    /// bounded below by the commit cursor.
    ///
    /// Ties cannot occur on timestamp (the index is bijective); among
    /// equal candidates the first allocated would win by construction.
    pub fn oldest_uncommitted_older_than(&self, cutoff: Time) -> Option<Symbol> {
        use std::ops::Bound;
        let floor = self.cursor.map(|c| self.nodes[c].timestamp);
        if let Some(f) = floor {
            if cutoff <= f {
                return None;
            }
        }
        let lower = match floor {
            Some(f) => Bound::Excluded(f),
            None => Bound::Unbounded,
        };
        for (_, &idx) in self.by_time.range((lower, Bound::Excluded(cutoff))) {
            if !self.nodes[idx].committed {
                return Some(self.nodes[idx].symbol);
            }
        }
        None
    }

    /// Freeze a node into the graph.
    ///
    /// Returns `Ok(false)` (a no-op, not an error) if the node was already
    /// committed, so repeated calls cannot corrupt state or double-submit.
    pub fn mark_committed(&mut self, sym: Symbol) -> Result<bool> {
        let idx = *self
            .by_symbol
            .get(&sym)
            .ok_or_else(|| Error::unknown_symbol(sym))?;
        if self.nodes[idx].committed {
            return Ok(false);
        }
        self.nodes[idx].committed = true;
        // Commits arrive oldest-first past the cursor, so this node is now
        // the latest committed in time order.
        self.cursor = Some(idx);
        self.uncommitted = self.uncommitted.saturating_sub(1);
        Ok(true)
    }

    /// Whether `sym` is an uncommitted pose node stranded behind the
    /// commit cursor. Such a node can never be committed or valued, so
    /// factors referencing it can never be solved. Non-pose and unknown
    /// symbols are not stranded.
    pub fn is_stranded(&self, sym: Symbol) -> bool {
        let node = match self.by_symbol.get(&sym) {
            Some(&idx) => &self.nodes[idx],
            None => return false,
        };
        if node.committed {
            return false;
        }
        match self.cursor {
            Some(c) => node.timestamp <= self.nodes[c].timestamp,
            None => false,
        }
    }

    /// The most recently committed node, if any.
    pub fn latest_committed(&self) -> Option<&PoseNode> {
        self.cursor.map(|c| &self.nodes[c])
    }

    /// Node lookup by symbol.
    pub fn node(&self, sym: Symbol) -> Option<&PoseNode> {
        self.by_symbol.get(&sym).map(|&idx| &self.nodes[idx])
    }

    /// All nodes in allocation order.
    pub fn nodes(&self) -> &[PoseNode] {
        &self.nodes
    }

    /// Pose symbol for `t`, allocating if needed (delegates to the index
    /// via [`append_pending`](Self::append_pending)).
    pub fn symbol_for_time(&mut self, t: Time) -> Symbol {
        self.append_pending(t)
    }

    /// Timestamp for a pose symbol.
    pub fn time_for_symbol(&self, sym: Symbol) -> Result<Time> {
        self.index.time_for_symbol(sym)
    }

    /// Uncommitted nodes still eligible for commit.
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Overlay pending predictions onto `solution` for every node the
    /// solver has not yet estimated. Used for "freshest picture" reads.
    pub fn overlay_uncommitted(&self, solution: &mut Solution) {
        for node in &self.nodes {
            if solution.contains(node.symbol) {
                continue;
            }
            if let Some(pose) = node.best_estimate() {
                solution.insert(node.symbol, Value::Pose(pose));
            }
        }
    }

    /// Clear all nodes and the time index.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.by_symbol.clear();
        self.by_time.clear();
        self.cursor = None;
        self.uncommitted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_idempotent() {
        let mut chain = PoseChain::new();
        let a = chain.append_pending(1000);
        let b = chain.append_pending(1000);
        assert_eq!(a, b);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.uncommitted_count(), 1);
    }

    #[test]
    fn test_update_prediction_guards() {
        let mut chain = PoseChain::new();
        let sym = chain.append_pending(1000);
        chain.update_prediction(sym, Pose2D::new(1.0, 0.0, 0.0)).unwrap();

        chain.mark_committed(sym).unwrap();
        let err = chain
            .update_prediction(sym, Pose2D::identity())
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyCommitted(s) if s == sym));

        let err = chain
            .update_prediction(Symbol::pose(99), Pose2D::identity())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_oldest_uncommitted_strict_cutoff() {
        let mut chain = PoseChain::new();
        let s0 = chain.append_pending(0);
        let _s1 = chain.append_pending(1_000_000);
        let _s3 = chain.append_pending(3_000_000);

        // cutoff excludes its own value (strict <).
        assert_eq!(chain.oldest_uncommitted_older_than(0), None);
        assert_eq!(chain.oldest_uncommitted_older_than(1), Some(s0));
        assert_eq!(chain.oldest_uncommitted_older_than(500_001), Some(s0));
    }

    #[test]
    fn test_mark_committed_idempotent() {
        let mut chain = PoseChain::new();
        let sym = chain.append_pending(1000);
        assert!(chain.mark_committed(sym).unwrap());
        assert!(!chain.mark_committed(sym).unwrap());
        assert_eq!(chain.latest_committed().unwrap().symbol, sym);
        assert_eq!(chain.uncommitted_count(), 0);
    }

    #[test]
    fn test_cursor_bounds_eligibility() {
        let mut chain = PoseChain::new();
        let s0 = chain.append_pending(1000);
        let s1 = chain.append_pending(2000);
        chain.mark_committed(s0).unwrap();
        chain.mark_committed(s1).unwrap();

        // Late arrival behind the cursor is never eligible.
        let late = chain.append_pending(1500);
        assert_eq!(chain.oldest_uncommitted_older_than(Time::MAX), None);
        assert_eq!(chain.uncommitted_count(), 0);
        assert!(chain.is_stranded(late));

        let s2 = chain.append_pending(3000);
        assert_eq!(chain.oldest_uncommitted_older_than(Time::MAX), Some(s2));
        // Ahead of the cursor, committed, and unknown symbols are fine.
        assert!(!chain.is_stranded(s2));
        assert!(!chain.is_stranded(s1));
        assert!(!chain.is_stranded(Symbol::pose(99)));
    }

    #[test]
    fn test_oldest_uncommitted_randomized() {
        use rand::prelude::*;
        let mut rng = StdRng::seed_from_u64(7);
        let mut chain = PoseChain::new();
        let mut times: Vec<Time> = (0..100).map(|_| rng.gen_range(1..1_000_000)).collect();
        times.sort_unstable();
        times.dedup();
        times.shuffle(&mut rng);
        for &t in &times {
            chain.append_pending(t);
        }

        for _ in 0..20 {
            let cutoff = rng.gen_range(1..1_100_000);
            let expected = times.iter().filter(|&&t| t < cutoff).min().copied();
            let got = chain
                .oldest_uncommitted_older_than(cutoff)
                .map(|s| chain.node(s).unwrap().timestamp);
            assert_eq!(got, expected, "cutoff {}", cutoff);
        }
    }

    #[test]
    fn test_overlay_uncommitted() {
        let mut chain = PoseChain::new();
        let s0 = chain.append_pending(1000);
        let s1 = chain.append_pending(2000);
        chain.update_prediction(s0, Pose2D::new(1.0, 0.0, 0.0)).unwrap();
        chain.update_prediction(s1, Pose2D::new(2.0, 0.0, 0.0)).unwrap();
        chain.mark_committed(s0).unwrap();
        chain.set_optimized(s0, Pose2D::new(1.1, 0.0, 0.0));

        let mut solution = Solution::new();
        solution.insert(s0, Value::Pose(Pose2D::new(1.1, 0.0, 0.0)));
        chain.overlay_uncommitted(&mut solution);

        // Solver estimate untouched, prediction filled in for the pending node.
        assert_eq!(solution.get_pose(s0).unwrap().x, 1.1);
        assert_eq!(solution.get_pose(s1).unwrap().x, 2.0);
    }
}
