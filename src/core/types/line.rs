//! Wall-segment representation for planar-surface observations.
//!
//! Walls are the 2D analogue of the planar surfaces a segmentation engine
//! extracts from range data. The mapper treats them as opaque landmark
//! values; only the reference solver does geometry with them.

use serde::{Deserialize, Serialize};

use super::{Point2D, Pose2D};

/// A line in 2D space represented as ax + by + c = 0.
///
/// Normalized so that a² + b² = 1, which makes `c` the signed distance
/// from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line2D {
    /// Normal vector x component
    pub a: f32,
    /// Normal vector y component
    pub b: f32,
    /// Signed distance from origin
    pub c: f32,
}

impl Line2D {
    /// Create a line from raw coefficients, normalizing the normal vector.
    ///
    /// Returns `None` if the normal is degenerate (a = b = 0).
    pub fn new(a: f32, b: f32, c: f32) -> Option<Self> {
        let norm = (a * a + b * b).sqrt();
        if norm < 1e-9 {
            return None;
        }
        Some(Self {
            a: a / norm,
            b: b / norm,
            c: c / norm,
        })
    }

    /// Line through two points.
    ///
    /// Returns `None` if the points coincide.
    pub fn from_points(p1: &Point2D, p2: &Point2D) -> Option<Self> {
        // Normal is perpendicular to the direction p1 -> p2.
        let a = p2.y - p1.y;
        let b = p1.x - p2.x;
        let c = -(a * p1.x + b * p1.y);
        Self::new(a, b, c)
    }

    /// Signed distance from a point to the line.
    #[inline]
    pub fn signed_distance(&self, point: &Point2D) -> f32 {
        self.a * point.x + self.b * point.y + self.c
    }

    /// Absolute distance from a point to the line.
    #[inline]
    pub fn distance(&self, point: &Point2D) -> f32 {
        self.signed_distance(point).abs()
    }

    /// Express a line observed in `pose`'s body frame in the global frame.
    ///
    /// For p_world = R p_body + t the normal rotates with R and the offset
    /// picks up -n_world · t.
    pub fn transformed(&self, pose: &Pose2D) -> Line2D {
        let (sin_t, cos_t) = pose.theta.sin_cos();
        let a = self.a * cos_t - self.b * sin_t;
        let b = self.a * sin_t + self.b * cos_t;
        let c = self.c - (a * pose.x + b * pose.y);
        Line2D { a, b, c }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_from_points_normalized() {
        let line = Line2D::from_points(&Point2D::new(0.0, 1.0), &Point2D::new(1.0, 1.0)).unwrap();
        assert_relative_eq!(line.a * line.a + line.b * line.b, 1.0, epsilon = 1e-6);
        // Horizontal line y = 1: distance from origin is 1.
        assert_relative_eq!(line.distance(&Point2D::new(5.0, 0.0)), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_points() {
        let p = Point2D::new(1.0, 1.0);
        assert!(Line2D::from_points(&p, &p).is_none());
    }

    #[test]
    fn test_transformed_preserves_point_distance() {
        // Wall x = 2 in the body frame, seen from a rotated, translated pose.
        let body = Line2D::new(1.0, 0.0, -2.0).unwrap();
        let pose = Pose2D::new(1.0, -0.5, FRAC_PI_2);
        let world = body.transformed(&pose);

        // A body-frame point on the wall must lie on the world-frame wall.
        let on_wall_body = Point2D::new(2.0, 3.0);
        let on_wall_world = pose.transform_point(&on_wall_body);
        assert_relative_eq!(world.distance(&on_wall_world), 0.0, epsilon = 1e-5);
    }
}
