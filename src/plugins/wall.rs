//! Channel-fed wall (planar-surface) measurement plugin.
//!
//! A segmentation engine extracts wall lines from range data on its own
//! thread and sends them with stable surface ids. Mirrors the landmark
//! plugin, with symbols in the `w` namespace and line-valued estimates.

use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender};

use crate::core::time::Time;
use crate::core::types::{Information2D, Line2D, Pose2D};
use crate::graph::{Factor, Symbol, Value};

use super::{MeasurementBatch, MeasurementPlugin, SymbolSource};

/// A single wall sighting from the segmentation engine.
#[derive(Debug, Clone, Copy)]
pub struct WallObservation {
    /// Timestamp of the observing pose.
    pub timestamp: Time,
    /// Stable surface id assigned by the segmenter.
    pub wall_id: u64,
    /// Wall line in the observing pose's body frame.
    pub line: Line2D,
    /// Measurement strength.
    pub information: Information2D,
}

/// Measurement plugin for tracked wall segments.
pub struct WallPlugin {
    name: String,
    rx: Receiver<WallObservation>,
    symbols: HashMap<u64, Symbol>,
    next_index: u64,
}

impl WallPlugin {
    /// Create a plugin and the sender its segmenter thread feeds.
    pub fn channel(name: &str) -> (Sender<WallObservation>, Self) {
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

    /// Symbol assigned to a surface id, if the wall has been seen.
    pub fn symbol_for_surface(&self, wall_id: u64) -> Option<Symbol> {
        self.symbols.get(&wall_id).copied()
    }

    fn observer_pose(symbols: &dyn SymbolSource, pose_sym: Symbol) -> Pose2D {
        symbols
            .estimate(pose_sym)
            .and_then(|v| v.as_pose())
            .or_else(|| symbols.latest_pose().map(|p| p.pose))
            .unwrap_or_default()
    }
}

impl MeasurementPlugin for WallPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_produce_factors(&mut self, symbols: &dyn SymbolSource) -> MeasurementBatch {
        let mut batch = MeasurementBatch::default();
        while let Ok(obs) = self.rx.try_recv() {
            let pose_sym = match symbols.pose_symbol_at_time(obs.timestamp) {
                Ok(sym) => sym,
                Err(e) => {
                    log::debug!("{}: observation dropped: {}", self.name, e);
                    break;
                }
            };
            if let std::collections::hash_map::Entry::Vacant(entry) =
                self.symbols.entry(obs.wall_id)
            {
                let wall_sym = Symbol::wall(self.next_index);
                self.next_index += 1;
                entry.insert(wall_sym);
                let world = obs.line.transformed(&Self::observer_pose(symbols, pose_sym));
                batch.values.push((wall_sym, Value::Wall(world)));
            }
            let wall_sym = self.symbols[&obs.wall_id];
            batch
                .factors
                .push(Factor::wall_sighting(pose_sym, wall_sym, obs.line, obs.information));
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::plugins::PoseStamped;

    struct OriginSource;

    impl SymbolSource for OriginSource {
        fn pose_symbol_at_time(&self, _t: Time) -> Result<Symbol> {
            Ok(Symbol::pose(0))
        }
        fn time_for_symbol(&self, _sym: Symbol) -> Result<Time> {
            Ok(0)
        }
        fn estimate(&self, sym: Symbol) -> Option<Value> {
            sym.is_pose().then(|| Value::Pose(Pose2D::identity()))
        }
        fn latest_pose(&self) -> Option<PoseStamped> {
            None
        }
    }

    #[test]
    fn test_wall_tracks_get_distinct_symbols() {
        let (tx, mut plugin) = WallPlugin::channel("walls");
        let line = Line2D::new(1.0, 0.0, -2.0).unwrap();
        for id in [3u64, 5, 3] {
            tx.send(WallObservation {
                timestamp: 1000,
                wall_id: id,
                line,
                information: Information2D::default(),
            })
            .unwrap();
        }

        let batch = plugin.try_produce_factors(&OriginSource);
        assert_eq!(batch.values.len(), 2);
        assert_eq!(batch.factors.len(), 3);
        assert_ne!(
            plugin.symbol_for_surface(3),
            plugin.symbol_for_surface(5)
        );
    }
}
