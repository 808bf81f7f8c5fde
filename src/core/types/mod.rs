//! Core geometric types for the pose graph.
//!
//! - [`Point2D`]: 2D point in meters
//! - [`Pose2D`]: robot pose (x, y, theta) in meters and radians
//! - [`Line2D`]: normalized wall line (planar-surface analogue in 2D)
//! - [`Information2D`]: inverse covariance for 2D constraints

mod information;
mod line;
mod pose;

pub use information::Information2D;
pub use line::Line2D;
pub use pose::{Point2D, Pose2D};
