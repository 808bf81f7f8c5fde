//! Information (inverse covariance) matrix for 2D constraints.

use serde::{Deserialize, Serialize};

/// Information matrix (inverse covariance) for a 2D pose constraint.
///
/// Stored as the upper triangle of a 3x3 symmetric matrix:
/// ```text
/// | xx  xy  xt |
/// | xy  yy  yt |
/// | xt  yt  tt |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Information2D {
    /// Information for x-x
    pub xx: f32,
    /// Information for x-y
    pub xy: f32,
    /// Information for x-theta
    pub xt: f32,
    /// Information for y-y
    pub yy: f32,
    /// Information for y-theta
    pub yt: f32,
    /// Information for theta-theta
    pub tt: f32,
}

impl Information2D {
    /// Create a diagonal information matrix.
    pub fn diagonal(xx: f32, yy: f32, tt: f32) -> Self {
        Self {
            xx,
            xy: 0.0,
            xt: 0.0,
            yy,
            yt: 0.0,
            tt,
        }
    }

    /// Create from standard deviations.
    pub fn from_std_dev(sigma_x: f32, sigma_y: f32, sigma_t: f32) -> Self {
        Self::diagonal(
            1.0 / (sigma_x * sigma_x),
            1.0 / (sigma_y * sigma_y),
            1.0 / (sigma_t * sigma_t),
        )
    }
}

impl Default for Information2D {
    fn default() -> Self {
        // 10cm position std dev, ~5 degree angle std dev
        Self::from_std_dev(0.1, 0.1, 0.087)
    }
}
