//! Channel-fed odometry pose plugin.
//!
//! A registration or wheel-odometry engine runs on its own thread,
//! computes relative-pose measurements, and sends them over a crossbeam
//! channel. This plugin turns each measurement into a pose proposal:
//! a new node at the measurement's timestamp, predicted by composing the
//! delta onto the current pose, plus a between-factor once registered as
//! primary. As a secondary it contributes only the between-factor.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::core::time::Time;
use crate::core::types::{Information2D, Pose2D};
use crate::graph::Factor;

use super::{PosePlugin, PoseProposal, PoseStamped, RelativePose};

/// A relative-pose measurement from an odometry source.
#[derive(Debug, Clone, Copy)]
pub struct OdometryMeasurement {
    /// Timestamp of the new pose.
    pub timestamp: Time,
    /// Relative transform from the previous pose to this one.
    pub delta: Pose2D,
    /// Measurement strength.
    pub information: Information2D,
}

/// Pose plugin fed by an odometry measurement channel.
pub struct OdometryPosePlugin {
    name: String,
    rx: Receiver<OdometryMeasurement>,
    /// Delta consumed as a proposal but not yet turned into a secondary
    /// constraint (secondary role only).
    last_delta: Option<OdometryMeasurement>,
}

impl OdometryPosePlugin {
    /// Create a plugin and the sender its producer thread feeds.
    pub fn channel(name: &str) -> (Sender<OdometryMeasurement>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            tx,
            Self {
                name: name.to_string(),
                rx,
                last_delta: None,
            },
        )
    }

    /// Create from an existing receiver.
    pub fn from_receiver(name: &str, rx: Receiver<OdometryMeasurement>) -> Self {
        Self {
            name: name.to_string(),
            rx,
            last_delta: None,
        }
    }
}

impl PosePlugin for OdometryPosePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn propose_next_pose(&mut self, current: Option<&PoseStamped>) -> Option<PoseProposal> {
        let m = match self.rx.try_recv() {
            Ok(m) => m,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
        };
        // Older-than-current measurements would create nodes behind the
        // commit cursor; drop them here instead.
        if let Some(cur) = current {
            if m.timestamp <= cur.timestamp {
                log::warn!(
                    "{}: dropping stale odometry at {}us (current pose at {}us)",
                    self.name,
                    m.timestamp,
                    cur.timestamp
                );
                return None;
            }
        }
        let predicted = current
            .map(|cur| cur.pose.compose(&m.delta))
            .unwrap_or(m.delta);
        Some(PoseProposal {
            timestamp: m.timestamp,
            predicted,
            relative: current.map(|_| RelativePose {
                delta: m.delta,
                information: m.information,
            }),
        })
    }

    fn constrain(&mut self, prev: &PoseStamped, next: &PoseStamped) -> Option<Factor> {
        // Secondary role: match a queued delta to the node pair by stamp.
        let m = match self.last_delta.take().or_else(|| self.rx.try_recv().ok()) {
            Some(m) => m,
            None => return None,
        };
        if m.timestamp != next.timestamp {
            self.last_delta = Some(m);
            return None;
        }
        Some(Factor::between(
            prev.symbol,
            next.symbol,
            m.delta,
            m.information,
        ))
    }
}
