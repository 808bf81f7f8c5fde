//! Channel-fed point-landmark measurement plugin.
//!
//! A detector (marker tracker, feature matcher) runs on its own thread and
//! sends body-frame landmark sightings with stable track ids. The plugin
//! allocates one graph symbol per track id in the `l` namespace, emits the
//! landmark's initial value on first sighting, and a sighting factor every
//! time.

use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender};

use crate::core::time::Time;
use crate::core::types::{Information2D, Point2D, Pose2D};
use crate::graph::{Factor, Symbol, Value};

use super::{MeasurementBatch, MeasurementPlugin, SymbolSource};

/// A single landmark sighting from the detector.
#[derive(Debug, Clone, Copy)]
pub struct LandmarkObservation {
    /// Timestamp of the observing pose.
    pub timestamp: Time,
    /// Stable track id assigned by the detector.
    pub landmark_id: u64,
    /// Landmark position in the observing pose's body frame.
    pub offset: Point2D,
    /// Measurement strength.
    pub information: Information2D,
}

/// Measurement plugin for tracked point landmarks.
pub struct LandmarkPlugin {
    name: String,
    rx: Receiver<LandmarkObservation>,
    symbols: HashMap<u64, Symbol>,
    next_index: u64,
}

impl LandmarkPlugin {
    /// Create a plugin and the sender its detector thread feeds.
    pub fn channel(name: &str) -> (Sender<LandmarkObservation>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (
            tx,
            Self {
                name: name.to_string(),
                rx,
                symbols: HashMap::new(),
                next_index: 0,
            },
        )
    }

    /// Symbol assigned to a track id, if the landmark has been seen.
    pub fn symbol_for_track(&self, landmark_id: u64) -> Option<Symbol> {
        self.symbols.get(&landmark_id).copied()
    }

    fn observer_pose(symbols: &dyn SymbolSource, pose_sym: Symbol) -> Pose2D {
        symbols
            .estimate(pose_sym)
            .and_then(|v| v.as_pose())
            .or_else(|| symbols.latest_pose().map(|p| p.pose))
            .unwrap_or_default()
    }
}

impl MeasurementPlugin for LandmarkPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_produce_factors(&mut self, symbols: &dyn SymbolSource) -> MeasurementBatch {
        let mut batch = MeasurementBatch::default();
        while let Ok(obs) = self.rx.try_recv() {
            let pose_sym = match symbols.pose_symbol_at_time(obs.timestamp) {
                Ok(sym) => sym,
                Err(e) => {
                    // Mapper resetting; drop the rest of this poll.
                    log::debug!("{}: observation dropped: {}", self.name, e);
                    break;
                }
            };
            if let std::collections::hash_map::Entry::Vacant(entry) =
                self.symbols.entry(obs.landmark_id)
            {
                let lm_sym = Symbol::landmark(self.next_index);
                self.next_index += 1;
                entry.insert(lm_sym);
                let world = Self::observer_pose(symbols, pose_sym).transform_point(&obs.offset);
                batch.values.push((lm_sym, Value::Landmark(world)));
            }
            let lm_sym = self.symbols[&obs.landmark_id];
            batch
                .factors
                .push(Factor::landmark_sighting(pose_sym, lm_sym, obs.offset, obs.information));
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::plugins::PoseStamped;

    /// Minimal symbol source for plugin tests.
    struct FixedSource {
        pose: Pose2D,
    }

    impl SymbolSource for FixedSource {
        fn pose_symbol_at_time(&self, _t: Time) -> Result<Symbol> {
            Ok(Symbol::pose(0))
        }
        fn time_for_symbol(&self, _sym: Symbol) -> Result<Time> {
            Ok(0)
        }
        fn estimate(&self, sym: Symbol) -> Option<Value> {
            sym.is_pose().then(|| Value::Pose(self.pose))
        }
        fn latest_pose(&self) -> Option<PoseStamped> {
            Some(PoseStamped {
                symbol: Symbol::pose(0),
                timestamp: 0,
                pose: self.pose,
            })
        }
    }

    fn obs(id: u64, x: f32) -> LandmarkObservation {
        LandmarkObservation {
            timestamp: 1000,
            landmark_id: id,
            offset: Point2D::new(x, 0.0),
            information: Information2D::default(),
        }
    }

    #[test]
    fn test_first_sighting_emits_value_and_factor() {
        let (tx, mut plugin) = LandmarkPlugin::channel("markers");
        tx.send(obs(7, 2.0)).unwrap();

        let source = FixedSource {
            pose: Pose2D::new(1.0, 0.0, 0.0),
        };
        let batch = plugin.try_produce_factors(&source);
        assert_eq!(batch.values.len(), 1);
        assert_eq!(batch.factors.len(), 1);

        // Initial value is seeded in the world frame.
        let (sym, value) = batch.values[0];
        assert_eq!(sym, Symbol::landmark(0));
        assert_eq!(value.as_landmark().unwrap().x, 3.0);
    }

    #[test]
    fn test_resight_emits_factor_only() {
        let (tx, mut plugin) = LandmarkPlugin::channel("markers");
        tx.send(obs(7, 2.0)).unwrap();
        tx.send(obs(7, 2.1)).unwrap();

        let source = FixedSource {
            pose: Pose2D::identity(),
        };
        let batch = plugin.try_produce_factors(&source);
        assert_eq!(batch.values.len(), 1);
        assert_eq!(batch.factors.len(), 2);
        assert_eq!(plugin.symbol_for_track(7), Some(Symbol::landmark(0)));
    }

    #[test]
    fn test_empty_channel_yields_empty_batch() {
        let (_tx, mut plugin) = LandmarkPlugin::channel("markers");
        let source = FixedSource {
            pose: Pose2D::identity(),
        };
        assert!(plugin.try_produce_factors(&source).is_empty());
    }
}
