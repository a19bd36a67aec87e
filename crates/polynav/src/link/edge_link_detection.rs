use glam::{Vec2, Vec3};
use polynav_common::{LineSegment3, Line3};

/// Links covering less than this squared length on the start edge are ignored
const MIN_EDGE_LINK_SQUARE_LENGTH: f32 = 0.02;

/// Squared distance under which two points are considered equal
const EQUALITY_SQUARE_DISTANCE: f32 = 0.0001;

/// cos(80°): half field of view of a jump relative to the edge normal
const JUMP_FOV_COS: f32 = 0.173_648_18;

/// Distance between two sampled jump points of a start edge
const JUMP_SAMPLE_SPACE: f32 = 1.0;

/// Outcome of [`EdgeLinkDetection::detect_link`].
///
/// Ranges are ratios on the start edge `[A, B]` where a ratio `r` denotes
/// `r * A + (1 - r) * B`. The start range is always greater or equal to the
/// end range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeLinkResult {
    NoLink,
    /// Edges are collinear and overlap: the character walks across
    Collinear { start_range: f32, end_range: f32 },
    /// Edges are apart: the character jumps
    Jump { start_range: f32, end_range: f32 },
}

impl EdgeLinkResult {
    pub fn has_edges_link(&self) -> bool {
        !matches!(self, EdgeLinkResult::NoLink)
    }

    pub fn is_jump_link(&self) -> bool {
        matches!(self, EdgeLinkResult::Jump { .. })
    }

    pub fn link_start_range(&self) -> Option<f32> {
        match *self {
            EdgeLinkResult::NoLink => None,
            EdgeLinkResult::Collinear { start_range, .. } | EdgeLinkResult::Jump { start_range, .. } => {
                Some(start_range)
            }
        }
    }

    pub fn link_end_range(&self) -> Option<f32> {
        match *self {
            EdgeLinkResult::NoLink => None,
            EdgeLinkResult::Collinear { end_range, .. } | EdgeLinkResult::Jump { end_range, .. } => {
                Some(end_range)
            }
        }
    }
}

/// Detects whether a character can go from an external edge of a polygon to
/// an external edge of another polygon, by walking or by jumping.
///
/// Both edges must belong to polygons oriented counter clockwise when seen
/// from the top, so the outside of a polygon is on the right of its edges.
#[derive(Debug, Clone, Copy)]
pub struct EdgeLinkDetection {
    jump_max_length: f32,
    jump_max_square_length: f32,
}

impl EdgeLinkDetection {
    pub fn new(jump_max_length: f32) -> Self {
        Self {
            jump_max_length,
            jump_max_square_length: jump_max_length * jump_max_length,
        }
    }

    pub fn detect_link(&self, start_edge: &LineSegment3, end_edge: &LineSegment3) -> EdgeLinkResult {
        let start_line = start_edge.to_line();
        let end_line = end_edge.to_line();

        if start_line.min_distance(&end_line) > self.jump_max_length {
            return EdgeLinkResult::NoLink;
        }

        if points_are_equal(start_edge.a, end_edge.b) && points_are_equal(start_edge.b, end_edge.a) {
            return EdgeLinkResult::Collinear {
                start_range: 1.0,
                end_range: 0.0,
            };
        }

        if is_collinear_lines(&start_line, &end_line) {
            let opposite_directions = (start_edge.b - start_edge.a).dot(end_edge.b - end_edge.a) < 0.0;
            return match collinear_edges_link(start_edge, end_edge) {
                Some((start_range, end_range)) if opposite_directions => EdgeLinkResult::Collinear {
                    start_range,
                    end_range,
                },
                _ => EdgeLinkResult::NoLink,
            };
        }

        self.detect_jump(start_edge, end_edge)
    }

    fn detect_jump(&self, start_edge: &LineSegment3, end_edge: &LineSegment3) -> EdgeLinkResult {
        let samples_count = 1 + (start_edge.length() / JUMP_SAMPLE_SPACE).ceil() as u32;

        let mut jump_start_range = -f32::MAX;
        let mut jump_end_range = f32::MAX;
        let mut has_jump_points = false;
        for i in 0..samples_count {
            let alpha = i as f32 / (samples_count as f32 - 1.0);
            let test_point = start_edge.point_at(alpha);
            let projected_point = end_edge.closest_point(test_point);

            if self.can_jump_that_far(test_point, projected_point)
                && is_proper_jump_direction(start_edge, end_edge, test_point, projected_point)
            {
                has_jump_points = true;
                jump_start_range = jump_start_range.max(alpha);
                jump_end_range = jump_end_range.min(alpha);
            }
        }

        if !has_jump_points || is_range_too_small(jump_start_range, jump_end_range, start_edge) {
            return EdgeLinkResult::NoLink;
        }
        EdgeLinkResult::Jump {
            start_range: jump_start_range,
            end_range: jump_end_range,
        }
    }

    fn can_jump_that_far(&self, jump_start: Vec3, jump_end: Vec3) -> bool {
        jump_start.distance_squared(jump_end) < self.jump_max_square_length
    }
}

fn points_are_equal(point1: Vec3, point2: Vec3) -> bool {
    point1.distance_squared(point2) < EQUALITY_SQUARE_DISTANCE
}

fn is_collinear_lines(line1: &Line3, line2: &Line3) -> bool {
    line1.distance_to_point(line2.a).powi(2) < EQUALITY_SQUARE_DISTANCE
        && line1.distance_to_point(line2.b).powi(2) < EQUALITY_SQUARE_DISTANCE
}

/// Overlapping range of two collinear edges, expressed on the start edge
fn collinear_edges_link(start_edge: &LineSegment3, end_edge: &LineSegment3) -> Option<(f32, f32)> {
    let min_intersection = start_edge.a.min(start_edge.b).max(end_edge.a.min(end_edge.b));
    let max_intersection = start_edge.a.max(start_edge.b).min(end_edge.a.max(end_edge.b));
    for axis in 0..3 {
        if min_intersection[axis] > max_intersection[axis] + EQUALITY_SQUARE_DISTANCE {
            return None;
        }
    }

    for axis in 0..3 {
        let denominator = start_edge.a[axis] - start_edge.b[axis];
        if denominator.abs() > f32::EPSILON {
            let mut start_range = (min_intersection[axis] - start_edge.b[axis]) / denominator;
            let mut end_range = (max_intersection[axis] - start_edge.b[axis]) / denominator;
            if start_range < end_range {
                std::mem::swap(&mut start_range, &mut end_range);
            }

            if is_range_too_small(start_range, end_range, start_edge) {
                return None;
            }
            return Some((start_range, end_range));
        }
    }
    None
}

/// Jump must leave the start polygon and enter the end polygon, within a
/// field of view of 80° around the edge normals
fn is_proper_jump_direction(start_edge: &LineSegment3, end_edge: &LineSegment3, jump_start: Vec3, jump_end: Vec3) -> bool {
    let jump_vector = Vec2::new(jump_end.x - jump_start.x, jump_end.z - jump_start.z).normalize_or_zero();

    let jump_outside_of_start_polygon = edge_normal_xz(start_edge).dot(jump_vector) >= JUMP_FOV_COS;
    jump_outside_of_start_polygon && edge_normal_xz(end_edge).dot(jump_vector) < -JUMP_FOV_COS
}

/// Normal of the edge in the `(x, z)` plane, pointing outside its polygon
fn edge_normal_xz(edge: &LineSegment3) -> Vec2 {
    let ab = Vec2::new(edge.b.x - edge.a.x, edge.b.z - edge.a.z);
    Vec2::new(-ab.y, ab.x).normalize_or_zero()
}

/// Links reduced to a point or a thin line are ignored
fn is_range_too_small(start_range: f32, end_range: f32, start_edge: &LineSegment3) -> bool {
    start_edge
        .point_at(start_range)
        .distance_squared(start_edge.point_at(end_range))
        < MIN_EDGE_LINK_SQUARE_LENGTH
}
