//! Angular arithmetic for 2D pose composition.

use std::f32::consts::PI;

/// Normalize angle to [-π, π].
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Shortest signed angular difference from `a` to `b`.
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    normalize_angle(b - a)
}
