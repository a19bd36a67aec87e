//! Math utilities

use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Converts degrees to radians
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg * PI / 180.0
}

/// Projects a 3D point on the horizontal plane as seen from the top: `(x, -z)`
#[inline]
pub fn to_top_view(point: Vec3) -> Vec2 {
    Vec2::new(point.x, -point.z)
}

/// Component-wise min/max of a set of 2D points. `None` for an empty set.
pub fn bounds_2d(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
    )
}

/// Checks if two 2D bounding rectangles overlap, borders included
#[inline]
pub fn overlap_bounds_2d(amin: Vec2, amax: Vec2, bmin: Vec2, bmax: Vec2) -> bool {
    amin.x <= bmax.x && amax.x >= bmin.x && amin.y <= bmax.y && amax.y >= bmin.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_view() {
        assert_eq!(to_top_view(Vec3::new(1.0, 2.0, 3.0)), Vec2::new(1.0, -3.0));
    }

    #[test]
    fn test_bounds_2d() {
        assert!(bounds_2d(&[]).is_none());
        let (min, max) = bounds_2d(&[
            Vec2::new(1.0, 5.0),
            Vec2::new(-2.0, 0.0),
            Vec2::new(3.0, 1.0),
        ])
        .unwrap();
        assert_eq!(min, Vec2::new(-2.0, 0.0));
        assert_eq!(max, Vec2::new(3.0, 5.0));
    }

    #[test]
    fn test_overlap_bounds_touching() {
        assert!(overlap_bounds_2d(
            Vec2::ZERO,
            Vec2::ONE,
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 1.0)
        ));
        assert!(!overlap_bounds_2d(
            Vec2::ZERO,
            Vec2::ONE,
            Vec2::new(1.1, 0.0),
            Vec2::new(2.0, 1.0)
        ));
    }

    #[test]
    fn test_deg_to_rad() {
        assert!((deg_to_rad(180.0) - PI).abs() < 1e-6);
        assert!((deg_to_rad(45.0) - PI / 4.0).abs() < 1e-6);
    }
}
