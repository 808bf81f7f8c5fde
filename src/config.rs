//! Mapper configuration.
//!
//! All settings are plain serde structs so they can be loaded from a TOML
//! file or built in code. Missing fields fall back to defaults.

use serde::Deserialize;

use crate::core::time::{secs_to_us, Time};
use crate::core::types::Pose2D;

/// Configuration for the mapper core and its dispatch loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Minimum age in seconds a pending pose must reach before it is
    /// eligible for commit. Gives slower measurement sources time to
    /// contribute factors referencing the pose.
    pub commit_window_s: f32,

    /// Force immediate commit eligibility, ignoring the window. Used for
    /// offline/batch replay where real-time pacing is irrelevant.
    pub suppress_commit_window: bool,

    /// Sleep between dispatch iterations when no work was done (ms).
    pub idle_sleep_ms: u64,

    /// Maximum uncommitted pose backlog before the commit window is
    /// bypassed to drain the chain (backpressure bound).
    pub max_pending_nodes: usize,

    /// Maximum factors retained across cycles while waiting for endpoint
    /// values. Oldest factors past this bound are dropped with a warning.
    pub max_deferred_factors: usize,

    /// Pose the first node is anchored at.
    pub initial_pose: Pose2D,

    /// Verbose per-cycle logging.
    pub debug: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            commit_window_s: 3.0,
            suppress_commit_window: false,
            idle_sleep_ms: 10,
            max_pending_nodes: 128,
            max_deferred_factors: 256,
            initial_pose: Pose2D::identity(),
            debug: false,
        }
    }
}

impl MapperConfig {
    /// Commit window in microseconds.
    pub fn commit_window_us(&self) -> Time {
        secs_to_us(self.commit_window_s)
    }

    /// Load configuration from a TOML file, falling back to defaults (with
    /// a warning) if the file is missing or malformed.
    pub fn from_file(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match basic_toml::from_str(&contents) {
                Ok(cfg) => {
                    log::info!("Loaded config from {}", path);
                    cfg
                }
                Err(e) => {
                    log::warn!("Failed to parse config {}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config {}: {}", path, e);
                Self::default()
            }
        }
    }
}
