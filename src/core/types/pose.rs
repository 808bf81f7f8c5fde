//! Pose and point types for the 2D pose graph.

use serde::{Deserialize, Serialize};

use crate::core::math::normalize_angle;

/// A 2D point in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in meters
    pub x: f32,
    /// Y coordinate in meters
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point (avoids sqrt).
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Robot pose in 2D space.
///
/// Position (x, y) in meters and heading (theta) in radians, with theta
/// normalized to [-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians, normalized to [-π, π]
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose with theta normalized to [-π, π].
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// Identity pose at origin with zero heading.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Compose two poses: self ⊕ other.
    ///
    /// Applies `other` as a transform expressed in `self`'s frame.
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// Inverse of this pose (the transform that undoes it).
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// Relative pose from `self` to `other`: self⁻¹ ⊕ other.
    ///
    /// This is the measurement form carried by odometry constraints.
    #[inline]
    pub fn between(&self, other: &Pose2D) -> Pose2D {
        self.inverse().compose(other)
    }

    /// Transform a point from this pose's frame to the global frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Point2D::new(
            self.x + point.x * cos_t - point.y * sin_t,
            self.y + point.x * sin_t + point.y * cos_t,
        )
    }

    /// Transform a point from the global frame into this pose's frame.
    #[inline]
    pub fn inverse_transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let dx = point.x - self.x;
        let dy = point.y - self.y;
        Point2D::new(dx * cos_t + dy * sin_t, -dx * sin_t + dy * cos_t)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}
