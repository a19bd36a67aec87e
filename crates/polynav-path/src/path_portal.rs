use glam::Vec3;
use polynav_common::LineSegment3;

/// Segment crossed by the character while following a corridor of
/// triangles.
///
/// Point `a` of the portal is on the left of the character when it crosses
/// the portal, `b` on its right. Start and end of a corridor are degenerate
/// portals reduced to a point.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPortal {
    portal: LineSegment3,
    transition_point: Option<Vec3>,
    jump_point: bool,
}

impl PathPortal {
    pub fn new(portal: LineSegment3) -> Self {
        Self {
            portal,
            transition_point: None,
            jump_point: false,
        }
    }

    pub fn from_point(point: Vec3) -> Self {
        Self::new(LineSegment3::new(point, point))
    }

    /// Corridor end where the character jumps
    pub fn jump_from(point: Vec3) -> Self {
        Self {
            jump_point: true,
            ..Self::from_point(point)
        }
    }

    pub fn portal(&self) -> &LineSegment3 {
        &self.portal
    }

    pub fn left_point(&self) -> Vec3 {
        self.portal.a
    }

    pub fn right_point(&self) -> Vec3 {
        self.portal.b
    }

    /// Point of the path on this portal, when the path turns there
    pub fn transition_point(&self) -> Option<Vec3> {
        self.transition_point
    }

    pub fn set_transition_point(&mut self, transition_point: Vec3) {
        self.transition_point = Some(transition_point);
    }

    pub fn is_jump_point(&self) -> bool {
        self.jump_point
    }
}
