use glam::Vec3;
use polynav_common::LineSegment3;
use serde::{Deserialize, Serialize};

use super::NavTriangle;

/// Walkable polygon of the navigation mesh, made of triangles sharing the
/// polygon points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPolygon {
    name: String,
    points: Vec<Vec3>,
    triangles: Vec<NavTriangle>,
}

impl NavPolygon {
    pub fn new(name: impl Into<String>, points: Vec<Vec3>, mut triangles: Vec<NavTriangle>) -> Self {
        for triangle in &mut triangles {
            triangle.compute_center_point(&points);
        }
        Self {
            name: name.into(),
            points,
            triangles,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    pub fn triangles(&self) -> &[NavTriangle] {
        &self.triangles
    }

    pub fn triangle(&self, index: usize) -> Option<&NavTriangle> {
        self.triangles.get(index)
    }

    pub(crate) fn triangles_mut(&mut self) -> &mut [NavTriangle] {
        &mut self.triangles
    }

    /// Edge `edge_index` of a triangle, in the triangle CCW order
    pub fn compute_edge(&self, triangle_index: usize, edge_index: usize) -> LineSegment3 {
        let triangle = &self.triangles[triangle_index];
        LineSegment3::new(
            self.points[triangle.index(edge_index)],
            self.points[triangle.index((edge_index + 1) % 3)],
        )
    }

    /// Declares the polygon index of this polygon in its navigation mesh
    pub(crate) fn relocate(&mut self, polygon_index: usize) {
        for triangle in &mut self.triangles {
            triangle.relocate(polygon_index);
        }
    }
}
