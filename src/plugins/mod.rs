//! Plugin contract: the three capability roles the mapper dispatches to.
//!
//! - [`PosePlugin`]: proposes new pose nodes (the designated primary) or
//!   constrains existing ones (secondaries).
//! - [`MeasurementPlugin`]: polled opportunistically for whatever factors
//!   are ready; must never block the dispatch loop.
//! - [`OutputPlugin`]: notified with an immutable snapshot after every
//!   successful optimize cycle, and with a degraded-cycle notification
//!   when the solver rejects a batch.
//!
//! Plugins run on the dispatch thread; their measurement sources run on
//! their own producer threads and hand data over through channels, so a
//! poll only ever picks up finished work.

mod landmark;
mod odometry;
mod output;
mod wall;

pub use landmark::{LandmarkObservation, LandmarkPlugin};
pub use odometry::{OdometryMeasurement, OdometryPosePlugin};
pub use output::{SnapshotLogger, TrajectoryLog, TrajectoryRecorder};
pub use wall::{WallObservation, WallPlugin};

use std::sync::Arc;

use crate::core::time::Time;
use crate::core::types::{Information2D, Pose2D};
use crate::error::Result;
use crate::graph::{Factor, GraphSnapshot, Symbol, Value};
use crate::solver::SolverError;

/// A committed or predicted pose with its identity and stamp, as handed to
/// pose plugins.
#[derive(Debug, Clone, Copy)]
pub struct PoseStamped {
    /// Graph symbol of the pose node.
    pub symbol: Symbol,
    /// Node timestamp in microseconds.
    pub timestamp: Time,
    /// Best current estimate of the pose.
    pub pose: Pose2D,
}

/// The mapper surface plugins resolve symbols against.
///
/// Calls take the mapper's state lock briefly; plugins must do their own
/// (potentially slow) geometry off these calls.
pub trait SymbolSource {
    /// Pose symbol for a timestamp, allocating a pending node if new.
    fn pose_symbol_at_time(&self, t: Time) -> Result<Symbol>;

    /// Timestamp for a pose symbol.
    fn time_for_symbol(&self, sym: Symbol) -> Result<Time>;

    /// Best current estimate for a symbol (solution, else prediction).
    fn estimate(&self, sym: Symbol) -> Option<Value>;

    /// The most recent committed pose, if any.
    fn latest_pose(&self) -> Option<PoseStamped>;
}

/// A new pose node proposed by the primary pose plugin.
#[derive(Debug, Clone, Copy)]
pub struct PoseProposal {
    /// Timestamp of the new node.
    pub timestamp: Time,
    /// Best-effort absolute pose prediction for the new node.
    pub predicted: Pose2D,
    /// Relative-pose constraint from the current node to the new one, if
    /// the plugin measured one. The mapper builds the factor once the new
    /// node's symbol is allocated.
    pub relative: Option<RelativePose>,
}

/// A measured relative transform with its strength.
#[derive(Debug, Clone, Copy)]
pub struct RelativePose {
    /// Relative transform current ⁻¹ ⊕ new.
    pub delta: Pose2D,
    /// Constraint strength.
    pub information: Information2D,
}

/// Pose-contributing plugin.
///
/// Exactly one plugin is registered as primary; it creates pose nodes and
/// their predictions. All other pose plugins only add constraining factors
/// between symbols that already exist.
pub trait PosePlugin: Send {
    /// Plugin name for diagnostics and factor attribution.
    fn name(&self) -> &str;

    /// Poll for a new pose node. Must return immediately; `None` means no
    /// measurement is ready this poll (an expected condition, not an
    /// error).
    fn propose_next_pose(&mut self, current: Option<&PoseStamped>) -> Option<PoseProposal>;

    /// Secondary role: produce a constraint between two existing nodes.
    fn constrain(&mut self, _prev: &PoseStamped, _next: &PoseStamped) -> Option<Factor> {
        None
    }
}

/// Values and factors produced by one measurement poll.
#[derive(Debug, Clone, Default)]
pub struct MeasurementBatch {
    /// Initial values for newly discovered symbols (landmarks, walls).
    pub values: Vec<(Symbol, Value)>,
    /// Factors ready for submission.
    pub factors: Vec<Factor>,
}

impl MeasurementBatch {
    /// Whether the poll produced nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.factors.is_empty()
    }
}

/// Measurement-contributing plugin.
pub trait MeasurementPlugin: Send {
    /// Plugin name for diagnostics and factor attribution.
    fn name(&self) -> &str;

    /// Return whatever factors are ready right now. Must not block.
    fn try_produce_factors(&mut self, symbols: &dyn SymbolSource) -> MeasurementBatch;
}

/// Output plugin, notified after each optimize cycle.
pub trait OutputPlugin: Send {
    /// Plugin name for diagnostics.
    fn name(&self) -> &str;

    /// A new consistent snapshot was published. The snapshot is immutable;
    /// keep the `Arc` if the data is needed beyond this call.
    fn on_snapshot(&mut self, snapshot: &Arc<GraphSnapshot>);

    /// The solver rejected the last batch; the previous snapshot remains
    /// in effect.
    fn on_solver_failure(&mut self, _error: &SolverError) {}
}
