//! Commit scheduling: when a pending pose node freezes into the graph.
//!
//! Each node moves Pending → Eligible → Committed. A node becomes eligible
//! once it is older than the commit window (measured against "now"), which
//! gives slower measurement sources time to contribute factors referencing
//! it. Commits happen one node per call, oldest first, so the solver always
//! receives pose nodes in temporal order.

use crate::config::MapperConfig;
use crate::core::time::Time;
use crate::core::types::Pose2D;
use crate::graph::{PoseChain, Symbol};

/// A pose node frozen by the scheduler, with the initial value it
/// contributes to the solver batch.
#[derive(Debug, Clone, Copy)]
pub struct CommittedPose {
    /// Symbol of the committed node.
    pub symbol: Symbol,
    /// Node timestamp.
    pub timestamp: Time,
    /// Initial value: the node's prediction, else the previous committed
    /// estimate, else the mapper's initial pose.
    pub initial: Pose2D,
}

/// Commit-window policy over the pose chain.
#[derive(Debug)]
pub struct CommitScheduler {
    commit_window_us: Time,
    suppress_commit_window: bool,
    max_pending_nodes: usize,
}

impl CommitScheduler {
    /// Build from mapper configuration.
    pub fn new(config: &MapperConfig) -> Self {
        Self {
            commit_window_us: config.commit_window_us(),
            suppress_commit_window: config.suppress_commit_window,
            max_pending_nodes: config.max_pending_nodes,
        }
    }

    /// Force or restore immediate commit eligibility.
    pub fn set_suppress_commit_window(&mut self, suppress: bool) {
        self.suppress_commit_window = suppress;
    }

    /// Whether the window is currently suppressed.
    pub fn suppress_commit_window(&self) -> bool {
        self.suppress_commit_window
    }

    /// Commit at most one pose node, oldest first.
    ///
    /// Returns the committed node and its initial value, or `None` when no
    /// node is eligible. Committing one node per call bounds the work
    /// injected into the solver per cycle.
    pub fn commit_next_pose_node(
        &self,
        chain: &mut PoseChain,
        now: Time,
        fallback: Pose2D,
    ) -> Option<CommittedPose> {
        // Backpressure: a backlog past the bound drains regardless of age.
        let unbounded =
            self.suppress_commit_window || chain.uncommitted_count() > self.max_pending_nodes;
        let cutoff = if unbounded {
            Time::MAX
        } else if now >= self.commit_window_us {
            // Inclusive bound: a node aged exactly commit_window is eligible.
            now - self.commit_window_us + 1
        } else {
            return None;
        };

        let symbol = chain.oldest_uncommitted_older_than(cutoff)?;
        let node = chain.node(symbol)?;
        let timestamp = node.timestamp;
        let initial = node
            .predicted
            .or_else(|| chain.latest_committed().and_then(|n| n.best_estimate()))
            .unwrap_or(fallback);

        match chain.mark_committed(symbol) {
            Ok(true) => {
                log::debug!("committed pose {} at {}us", symbol, timestamp);
                Some(CommittedPose {
                    symbol,
                    timestamp,
                    initial,
                })
            }
            // Unreachable for a symbol the chain just returned as
            // uncommitted, but don't let a bookkeeping bug commit twice.
            _ => None,
        }
    }
}
