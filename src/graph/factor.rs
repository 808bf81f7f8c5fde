//! Factors, values, and solutions.
//!
//! A factor is an opaque constraint relating one or more symbols. The
//! mapper core never interprets constraint payloads; it only tracks their
//! endpoints to enforce referential integrity (a value must exist for every
//! endpoint before the factor reaches the solver). The concrete constraint
//! forms here are the ones the bundled plugins and reference solver speak.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Information2D, Line2D, Point2D, Pose2D};

use super::symbol::Symbol;

/// An initial or optimized estimate for a graph variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Robot pose.
    Pose(Pose2D),
    /// Point landmark in the global frame.
    Landmark(Point2D),
    /// Wall line in the global frame.
    Wall(Line2D),
}

impl Value {
    /// Pose payload, if this is a pose value.
    pub fn as_pose(&self) -> Option<Pose2D> {
        match self {
            Value::Pose(p) => Some(*p),
            _ => None,
        }
    }

    /// Landmark payload, if this is a landmark value.
    pub fn as_landmark(&self) -> Option<Point2D> {
        match self {
            Value::Landmark(p) => Some(*p),
            _ => None,
        }
    }

    /// Wall payload, if this is a wall value.
    pub fn as_wall(&self) -> Option<Line2D> {
        match self {
            Value::Wall(l) => Some(*l),
            _ => None,
        }
    }
}

/// Constraint payload of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Absolute pose prior. Endpoints: [pose].
    PriorPose {
        /// Prior pose estimate.
        pose: Pose2D,
        /// Constraint strength.
        information: Information2D,
    },

    /// Relative pose between two nodes: from⁻¹ ⊕ to. Endpoints: [from, to].
    BetweenPose {
        /// Measured relative transform.
        delta: Pose2D,
        /// Constraint strength.
        information: Information2D,
    },

    /// Point landmark seen from a pose. Endpoints: [pose, landmark].
    LandmarkSighting {
        /// Landmark position in the observing pose's body frame.
        offset: Point2D,
        /// Constraint strength.
        information: Information2D,
    },

    /// Wall seen from a pose. Endpoints: [pose, wall].
    WallSighting {
        /// Wall line in the observing pose's body frame.
        line: Line2D,
        /// Constraint strength.
        information: Information2D,
    },
}

/// A constraint plus the symbols it relates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    /// Symbols this factor constrains, in constraint-specific order.
    pub endpoints: Vec<Symbol>,
    /// The constraint payload.
    pub constraint: Constraint,
}

impl Factor {
    /// Absolute prior on a pose.
    pub fn prior(sym: Symbol, pose: Pose2D, information: Information2D) -> Self {
        Self {
            endpoints: vec![sym],
            constraint: Constraint::PriorPose { pose, information },
        }
    }

    /// Relative-pose constraint between two poses.
    pub fn between(from: Symbol, to: Symbol, delta: Pose2D, information: Information2D) -> Self {
        Self {
            endpoints: vec![from, to],
            constraint: Constraint::BetweenPose { delta, information },
        }
    }

    /// Landmark observation from a pose.
    pub fn landmark_sighting(
        pose: Symbol,
        landmark: Symbol,
        offset: Point2D,
        information: Information2D,
    ) -> Self {
        Self {
            endpoints: vec![pose, landmark],
            constraint: Constraint::LandmarkSighting {
                offset,
                information,
            },
        }
    }

    /// Wall observation from a pose.
    pub fn wall_sighting(
        pose: Symbol,
        wall: Symbol,
        line: Line2D,
        information: Information2D,
    ) -> Self {
        Self {
            endpoints: vec![pose, wall],
            constraint: Constraint::WallSighting { line, information },
        }
    }
}

/// Current best estimate for every known symbol.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    estimates: HashMap<Symbol, Value>,
}

impl Solution {
    /// Empty solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an estimate.
    pub fn insert(&mut self, sym: Symbol, value: Value) {
        self.estimates.insert(sym, value);
    }

    /// Estimate for a symbol.
    pub fn get(&self, sym: Symbol) -> Option<&Value> {
        self.estimates.get(&sym)
    }

    /// Pose estimate for a symbol, if present and a pose.
    pub fn get_pose(&self, sym: Symbol) -> Option<Pose2D> {
        self.estimates.get(&sym).and_then(Value::as_pose)
    }

    /// Whether a symbol has an estimate.
    pub fn contains(&self, sym: Symbol) -> bool {
        self.estimates.contains_key(&sym)
    }

    /// Iterate over all estimates.
    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Value)> {
        self.estimates.iter()
    }

    /// Number of estimated symbols.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Whether the solution is empty.
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}
