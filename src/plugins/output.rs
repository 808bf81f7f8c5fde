//! Bundled output plugins: trajectory recording and snapshot logging.

use std::sync::{Arc, Mutex};

use crate::core::types::Pose2D;
use crate::graph::{GraphSnapshot, Symbol};
use crate::solver::SolverError;

use super::OutputPlugin;

/// What the recorder has observed so far. Shared with the owner of the
/// recorder through [`TrajectoryRecorder::handle`].
#[derive(Debug, Default)]
pub struct TrajectoryLog {
    /// Version of the last snapshot seen.
    pub last_version: u64,
    /// Total snapshots received.
    pub snapshots: u64,
    /// Degraded-cycle notifications received.
    pub failures: u64,
    /// Pose estimates from the last snapshot, ordered by symbol index.
    pub trajectory: Vec<(Symbol, Pose2D)>,
}

/// Output plugin that records every published trajectory.
///
/// Stands in for a visualizer: consumers read the log handle instead of a
/// pub/sub topic.
pub struct TrajectoryRecorder {
    name: String,
    log: Arc<Mutex<TrajectoryLog>>,
}

impl TrajectoryRecorder {
    /// Create a recorder.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log: Arc::new(Mutex::new(TrajectoryLog::default())),
        }
    }

    /// Shared handle to the recorded log.
    pub fn handle(&self) -> Arc<Mutex<TrajectoryLog>> {
        self.log.clone()
    }
}

impl OutputPlugin for TrajectoryRecorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_snapshot(&mut self, snapshot: &Arc<GraphSnapshot>) {
        let mut trajectory: Vec<(Symbol, Pose2D)> = snapshot
            .solution
            .iter()
            .filter_map(|(&sym, v)| v.as_pose().map(|p| (sym, p)))
            .collect();
        trajectory.sort_by_key(|(sym, _)| *sym);

        let mut log = self.log.lock().unwrap();
        log.last_version = snapshot.version;
        log.snapshots += 1;
        log.trajectory = trajectory;
    }

    fn on_solver_failure(&mut self, _error: &SolverError) {
        self.log.lock().unwrap().failures += 1;
    }
}

/// Output plugin that logs a one-line summary per snapshot.
#[derive(Debug, Default)]
pub struct SnapshotLogger;

impl SnapshotLogger {
    /// Create a logger.
    pub fn new() -> Self {
        Self
    }
}

impl OutputPlugin for SnapshotLogger {
    fn name(&self) -> &str {
        "snapshot-logger"
    }

    fn on_snapshot(&mut self, snapshot: &Arc<GraphSnapshot>) {
        log::info!(
            "snapshot v{}: {} factors, {} symbols",
            snapshot.version,
            snapshot.factors.len(),
            snapshot.solution.len()
        );
    }

    fn on_solver_failure(&mut self, error: &SolverError) {
        log::warn!("degraded cycle: {}", error);
    }
}
