use glam::Vec3;
use polynav_common::LineSegment3;
use serde::{Deserialize, Serialize};

/// Reference to a triangle of a [`crate::NavMesh`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavTriangleRef {
    pub polygon_index: usize,
    pub triangle_index: usize,
}

impl NavTriangleRef {
    pub fn new(polygon_index: usize, triangle_index: usize) -> Self {
        Self {
            polygon_index,
            triangle_index,
        }
    }
}

/// Kind of traversal between two triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavLinkType {
    /// Edge shared by two triangles of the same polygon
    Standard,
    /// Walk across collinear edges of two different polygons
    JoinPolygons,
    /// Jump over a gap between two polygons
    Jump,
}

/// Restricts a link to a portion of its source edge.
///
/// Ratios are expressed on the source edge `[A, B]` with
/// `point(ratio) = ratio * A + (1 - ratio) * B`, so the start ratio is
/// always greater than or equal to the end ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavLinkConstraint {
    source_edge_start_ratio: f32,
    source_edge_end_ratio: f32,
    target_edge_index: usize,
}

impl NavLinkConstraint {
    pub fn new(source_edge_start_ratio: f32, source_edge_end_ratio: f32, target_edge_index: usize) -> Self {
        debug_assert!(source_edge_start_ratio >= source_edge_end_ratio);
        Self {
            source_edge_start_ratio,
            source_edge_end_ratio,
            target_edge_index,
        }
    }

    pub fn source_edge_start_ratio(&self) -> f32 {
        self.source_edge_start_ratio
    }

    pub fn source_edge_end_ratio(&self) -> f32 {
        self.source_edge_end_ratio
    }

    pub fn target_edge_index(&self) -> usize {
        self.target_edge_index
    }

    pub fn source_start_point(&self, source_edge: &LineSegment3) -> Vec3 {
        source_edge.point_at(self.source_edge_start_ratio)
    }

    pub fn source_end_point(&self, source_edge: &LineSegment3) -> Vec3 {
        source_edge.point_at(self.source_edge_end_ratio)
    }

    /// Part of the source edge usable by the link
    pub fn clip(&self, source_edge: &LineSegment3) -> LineSegment3 {
        LineSegment3::new(
            self.source_start_point(source_edge),
            self.source_end_point(source_edge),
        )
    }

    /// Clamps a ratio of the source edge into the constrained range
    pub fn clamp_ratio(&self, ratio: f32) -> f32 {
        ratio.clamp(self.source_edge_end_ratio, self.source_edge_start_ratio)
    }
}

/// Directed link from an edge of a triangle to another triangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    link_type: NavLinkType,
    source_edge_index: usize,
    target: NavTriangleRef,
    constraint: Option<NavLinkConstraint>,
}

impl NavLink {
    pub fn new_standard(source_edge_index: usize, target: NavTriangleRef) -> Self {
        Self {
            link_type: NavLinkType::Standard,
            source_edge_index,
            target,
            constraint: None,
        }
    }

    pub fn new_join_polygons(source_edge_index: usize, target: NavTriangleRef, constraint: NavLinkConstraint) -> Self {
        Self {
            link_type: NavLinkType::JoinPolygons,
            source_edge_index,
            target,
            constraint: Some(constraint),
        }
    }

    pub fn new_jump(source_edge_index: usize, target: NavTriangleRef, constraint: NavLinkConstraint) -> Self {
        Self {
            link_type: NavLinkType::Jump,
            source_edge_index,
            target,
            constraint: Some(constraint),
        }
    }

    pub fn link_type(&self) -> NavLinkType {
        self.link_type
    }

    pub fn source_edge_index(&self) -> usize {
        self.source_edge_index
    }

    pub fn target(&self) -> NavTriangleRef {
        self.target
    }

    pub fn constraint(&self) -> Option<&NavLinkConstraint> {
        self.constraint.as_ref()
    }

    pub(crate) fn retarget_polygon(&mut self, polygon_index: usize) {
        self.target.polygon_index = polygon_index;
    }
}
