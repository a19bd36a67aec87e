//! Planes in Hessian normal form

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Squared length under which the cross product of two unit normals is
/// considered null (planes parallel)
const PARALLEL_PLANES_EPSILON: f32 = 0.01;

/// Plane defined by `normal · p + d = 0`, with a unit normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane through a point with the given unit normal
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane through three points, normal oriented by `(p2 - p1) × (p3 - p1)`.
    /// Returns `None` when the points are collinear.
    pub fn from_points(p1: Vec3, p2: Vec3, p3: Vec3) -> Option<Self> {
        let normal = (p2 - p1).cross(p3 - p1).try_normalize()?;
        Some(Self::from_normal_and_point(normal, p1))
    }

    /// Signed distance of a point to the plane, positive on the normal side
    #[inline]
    pub fn distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Same plane moved along its normal by `distance`
    pub fn translated(&self, distance: f32) -> Self {
        Self {
            normal: self.normal,
            d: self.d - distance,
        }
    }

    /// Intersection point of three planes, `None` if any two are parallel
    pub fn intersect_three(p1: &Plane, p2: &Plane, p3: &Plane) -> Option<Vec3> {
        let n1 = p1.normal;
        let n2 = p2.normal;
        let n3 = p3.normal;
        if n1.cross(n2).length_squared() < PARALLEL_PLANES_EPSILON
            || n2.cross(n3).length_squared() < PARALLEL_PLANES_EPSILON
            || n3.cross(n1).length_squared() < PARALLEL_PLANES_EPSILON
        {
            return None;
        }

        let denominator = n1.dot(n2.cross(n3));
        if denominator == 0.0 {
            return None;
        }
        let numerator = n2.cross(n3) * p1.d + n3.cross(n1) * p2.d + n1.cross(n2) * p3.d;
        Some(-numerator / denominator)
    }

    /// Intersection point of segment [a, b] with the plane. Segments lying in
    /// the plane or not reaching it give `None`.
    pub fn intersect_segment(&self, a: Vec3, b: Vec3) -> Option<Vec3> {
        let da = self.distance(a);
        let db = self.distance(b);
        if (da > 0.0 && db > 0.0) || (da < 0.0 && db < 0.0) || da == db {
            return None;
        }
        let t = da / (da - db);
        Some(a + (b - a) * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(plane.distance(Vec3::new(5.0, 3.0, 1.0)), 1.0);
        assert_eq!(plane.translated(0.5).distance(Vec3::new(5.0, 3.0, 1.0)), 0.5);
    }

    #[test]
    fn test_intersect_three_planes() {
        let px = Plane::from_normal_and_point(Vec3::X, Vec3::new(1.0, 0.0, 0.0));
        let py = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
        let pz = Plane::from_normal_and_point(Vec3::Z, Vec3::new(0.0, 0.0, 3.0));
        let point = Plane::intersect_three(&px, &py, &pz).unwrap();
        assert!((point - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);

        let px2 = Plane::from_normal_and_point(Vec3::X, Vec3::new(4.0, 0.0, 0.0));
        assert!(Plane::intersect_three(&px, &px2, &pz).is_none());
    }

    #[test]
    fn test_intersect_segment() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 1.0, 0.0));
        let hit = plane
            .intersect_segment(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 0.0))
            .unwrap();
        assert!((hit - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
        assert!(plane
            .intersect_segment(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, 0.0))
            .is_none());
    }
}
