//! Angle and Frame Helpers
//!
//! Heading normalization and the rigid-body transforms used by the motion
//! controller and the capture detector.
//!
//! All headings are radians, counter-clockwise from world +X, and are kept in
//! the half-open interval (-π, π].

use std::f64::consts::{PI, TAU};
use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// Planar pose of an entity: position, height and heading.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Position in the arena plane
    pub position: Vec2,
    /// Height above the floor (never touched by planar motion)
    pub z: f64,
    /// Heading in (-π, π]
    pub heading: f64,
}

impl Pose {
    /// Create a pose, normalizing the heading.
    pub fn new(x: f64, y: f64, z: f64, heading: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            z,
            heading: normalize_angle(heading),
        }
    }

    /// Overwrite the heading, keeping it normalized.
    #[inline]
    pub fn set_heading(&mut self, heading: f64) {
        self.heading = normalize_angle(heading);
    }
}

/// Normalize an angle into (-π, π].
///
/// Idempotent. Non-finite input maps to 0 so a stray NaN cannot poison a
/// heading that is integrated every tick.
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid lands on [-π, π); fold the lower edge onto +π
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// Smallest signed rotation taking `current` onto `target`.
///
/// The result lies in (-π, π], so `|delta| <= π`.
#[inline]
pub fn shortest_angular_delta(target: f64, current: f64) -> f64 {
    normalize_angle(normalize_angle(target) - normalize_angle(current))
}

/// Interpolate between two headings along the shortest arc.
///
/// `t` is clamped to [0, 1]; `t = 1` returns exactly the normalized `end`.
#[inline]
pub fn lerp_angle(start: f64, end: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        return normalize_angle(end);
    }
    normalize_angle(start + shortest_angular_delta(end, start) * t)
}

/// Heading from `from` towards `to`.
#[inline]
pub fn bearing(from: Vec2, to: Vec2) -> f64 {
    normalize_angle((to - from).angle())
}

/// Express a world point in the frame of `origin` (x forward, y left).
#[inline]
pub fn world_to_local(point: Vec2, origin: &Pose) -> Vec2 {
    (point - origin.position).rotate(-origin.heading)
}

/// Inverse of [`world_to_local`].
#[inline]
pub fn local_to_world(local: Vec2, origin: &Pose) -> Vec2 {
    local.rotate(origin.heading) + origin.position
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn same_rotation(a: f64, b: f64) -> bool {
        let d = (a - b).rem_euclid(TAU);
        d < 1e-6 || (TAU - d) < 1e-6
    }

    #[test]
    fn test_normalize_edges() {
        assert_eq!(normalize_angle(PI), PI);
        assert_eq!(normalize_angle(-PI), PI);
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!((normalize_angle(3.0 * PI).abs() - PI).abs() < EPS);
        assert!((normalize_angle(-FRAC_PI_2 - TAU) + FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_normalize_non_finite() {
        assert_eq!(normalize_angle(f64::NAN), 0.0);
        assert_eq!(normalize_angle(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_shortest_delta_wraps() {
        // From just below +π to just above -π is a small positive step
        let delta = shortest_angular_delta(-PI + 0.1, PI - 0.1);
        assert!((delta - 0.2).abs() < EPS);

        let delta = shortest_angular_delta(0.0, FRAC_PI_2);
        assert!((delta + FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_lerp_angle_takes_short_way() {
        let mid = lerp_angle(PI - 0.2, -PI + 0.2, 0.5);
        assert!((mid.abs() - PI).abs() < EPS);
        assert_eq!(lerp_angle(0.3, 1.2, 1.0), 1.2);
        assert_eq!(lerp_angle(0.3, 1.2, 5.0), 1.2);
        assert_eq!(lerp_angle(0.3, 1.2, -1.0), 0.3);
    }

    #[test]
    fn test_bearing() {
        assert_eq!(bearing(Vec2::ZERO, Vec2::new(1.0, 0.0)), 0.0);
        assert!((bearing(Vec2::ZERO, Vec2::new(0.0, 2.0)) - FRAC_PI_2).abs() < EPS);
        assert_eq!(bearing(Vec2::ZERO, Vec2::new(-1.0, 0.0)), PI);
    }

    #[test]
    fn test_world_to_local_axes() {
        // Agent at (1, 1) facing +Y: a point further along +Y is straight ahead
        let origin = Pose::new(1.0, 1.0, 0.0, FRAC_PI_2);
        let local = world_to_local(Vec2::new(1.0, 1.5), &origin);
        assert!((local.x - 0.5).abs() < EPS);
        assert!(local.y.abs() < EPS);

        // A point at world -X of the agent is on its left
        let local = world_to_local(Vec2::new(0.8, 1.0), &origin);
        assert!(local.x.abs() < EPS);
        assert!((local.y - 0.2).abs() < EPS);
    }

    #[test]
    fn test_pose_heading_is_normalized() {
        let mut pose = Pose::new(0.0, 0.0, 0.1, -PI);
        assert_eq!(pose.heading, PI);
        pose.set_heading(FRAC_PI_2 + 4.0 * TAU);
        assert!((pose.heading - FRAC_PI_2).abs() < EPS);
    }

    proptest! {
        #[test]
        fn prop_normalize_range_and_rotation(a in -1.0e4f64..1.0e4) {
            let n = normalize_angle(a);
            prop_assert!(n > -PI && n <= PI);
            prop_assert!(same_rotation(n, a));
        }

        #[test]
        fn prop_normalize_idempotent(a in -1.0e4f64..1.0e4) {
            let n = normalize_angle(a);
            prop_assert_eq!(normalize_angle(n), n);
        }

        #[test]
        fn prop_shortest_delta_reaches_target(target in -20.0f64..20.0, current in -20.0f64..20.0) {
            let delta = shortest_angular_delta(target, current);
            prop_assert!(delta.abs() <= PI);
            prop_assert!(same_rotation(normalize_angle(current + delta), normalize_angle(target)));
        }

        #[test]
        fn prop_local_world_inverse(
            px in -2.0f64..2.0, py in -2.0f64..2.0,
            ox in -2.0f64..2.0, oy in -2.0f64..2.0, h in -PI..PI,
        ) {
            let origin = Pose::new(ox, oy, 0.0, h);
            let point = Vec2::new(px, py);
            let back = local_to_world(world_to_local(point, &origin), &origin);
            prop_assert!(back.distance(point) < 1e-9);
        }
    }
}
