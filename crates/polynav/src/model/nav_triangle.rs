use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{NavLink, NavLinkConstraint, NavLinkType, NavTriangleRef};

/// Triangle of a navigation polygon.
///
/// Indices point into the owning polygon points and are in counter
/// clockwise order seen from the top. Edge `i` goes from `indices[i]` to
/// `indices[(i + 1) % 3]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavTriangle {
    indices: [usize; 3],
    center_point: Vec3,
    links: Vec<NavLink>,
}

impl NavTriangle {
    pub fn new(index1: usize, index2: usize, index3: usize) -> Self {
        debug_assert!(index1 != index2 && index1 != index3 && index2 != index3);
        Self {
            indices: [index1, index2, index3],
            center_point: Vec3::ZERO,
            links: Vec::with_capacity(3),
        }
    }

    pub fn indices(&self) -> [usize; 3] {
        self.indices
    }

    pub fn index(&self, position: usize) -> usize {
        self.indices[position]
    }

    /// Barycenter of the triangle, computed once attached to its polygon
    pub fn center_point(&self) -> Vec3 {
        self.center_point
    }

    pub(crate) fn compute_center_point(&mut self, points: &[Vec3]) {
        self.center_point =
            (points[self.indices[0]] + points[self.indices[1]] + points[self.indices[2]]) / 3.0;
    }

    pub fn links(&self) -> &[NavLink] {
        &self.links
    }

    pub fn add_standard_link(&mut self, edge_index: usize, target: NavTriangleRef) {
        debug_assert!(edge_index <= 2);
        debug_assert!(
            !self.has_edge_links(edge_index),
            "a standard link excludes any other link on edge {edge_index}"
        );
        self.links.push(NavLink::new_standard(edge_index, target));
    }

    pub fn add_join_polygons_link(&mut self, edge_index: usize, target: NavTriangleRef, constraint: NavLinkConstraint) {
        debug_assert!(self.is_external_edge(edge_index));
        self.links
            .push(NavLink::new_join_polygons(edge_index, target, constraint));
    }

    pub fn add_jump_link(&mut self, edge_index: usize, target: NavTriangleRef, constraint: NavLinkConstraint) {
        debug_assert!(self.is_external_edge(edge_index));
        self.links.push(NavLink::new_jump(edge_index, target, constraint));
    }

    pub fn has_edge_links(&self, edge_index: usize) -> bool {
        self.links
            .iter()
            .any(|link| link.source_edge_index() == edge_index)
    }

    /// An edge is external when no standard link crosses it
    pub fn is_external_edge(&self, edge_index: usize) -> bool {
        !self.links.iter().any(|link| {
            link.source_edge_index() == edge_index && link.link_type() == NavLinkType::Standard
        })
    }

    /// Points standard links to the polygon now holding this triangle
    pub(crate) fn relocate(&mut self, polygon_index: usize) {
        for link in &mut self.links {
            if link.link_type() == NavLinkType::Standard {
                link.retarget_polygon(polygon_index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_links() {
        let mut triangle = NavTriangle::new(0, 1, 2);
        assert!(triangle.is_external_edge(0));
        assert!(!triangle.has_edge_links(0));

        triangle.add_standard_link(0, NavTriangleRef::new(0, 1));
        assert!(!triangle.is_external_edge(0));
        assert!(triangle.has_edge_links(0));

        triangle.add_jump_link(1, NavTriangleRef::new(3, 0), NavLinkConstraint::new(1.0, 0.0, 0));
        assert!(triangle.is_external_edge(1));
        assert!(triangle.has_edge_links(1));
        assert_eq!(triangle.links().len(), 2);
    }

    #[test]
    fn test_relocate_keeps_cross_polygon_links() {
        let mut triangle = NavTriangle::new(0, 1, 2);
        triangle.add_standard_link(0, NavTriangleRef::new(0, 1));
        triangle.add_join_polygons_link(1, NavTriangleRef::new(4, 2), NavLinkConstraint::new(0.8, 0.2, 0));

        triangle.relocate(7);
        assert_eq!(triangle.links()[0].target(), NavTriangleRef::new(7, 1));
        assert_eq!(triangle.links()[1].target(), NavTriangleRef::new(4, 2));
        assert_eq!(triangle.links()[1].link_type(), NavLinkType::JoinPolygons);
    }

    #[test]
    fn test_center_point() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 3.0, 3.0),
        ];
        let mut triangle = NavTriangle::new(0, 1, 2);
        triangle.compute_center_point(&points);
        assert_eq!(triangle.center_point(), Vec3::new(1.0, 1.0, 1.0));
    }
}
