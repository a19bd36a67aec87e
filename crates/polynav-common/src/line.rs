//! 3D lines and segments

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment3 {
    pub a: Vec3,
    pub b: Vec3,
}

impl LineSegment3 {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }

    pub fn middle(&self) -> Vec3 {
        (self.a + self.b) * 0.5
    }

    /// Point at `alpha * a + (1 - alpha) * b`
    #[inline]
    pub fn point_at(&self, alpha: f32) -> Vec3 {
        self.a * alpha + self.b * (1.0 - alpha)
    }

    /// Closest point of the segment to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let ab = self.b - self.a;
        let length_sq = ab.length_squared();
        if length_sq == 0.0 {
            return self.a;
        }
        let t = ((point - self.a).dot(ab) / length_sq).clamp(0.0, 1.0);
        self.a + ab * t
    }

    /// Infinite line holding the segment
    pub fn to_line(&self) -> Line3 {
        Line3::new(self.a, self.b)
    }
}

/// Infinite line through two distinct points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub a: Vec3,
    pub b: Vec3,
}

impl Line3 {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    /// Distance between the line and a point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let direction = self.b - self.a;
        let length = direction.length();
        if length == 0.0 {
            return self.a.distance(point);
        }
        (point - self.a).cross(direction).length() / length
    }

    /// Minimum distance between two infinite lines
    pub fn min_distance(&self, other: &Line3) -> f32 {
        let u = self.b - self.a;
        let v = other.b - other.a;
        let normal = u.cross(v);
        let normal_length = normal.length();
        if normal_length <= 1e-6 * u.length() * v.length() {
            return self.distance_to_point(other.a);
        }
        (other.a - self.a).dot(normal).abs() / normal_length
    }
}
