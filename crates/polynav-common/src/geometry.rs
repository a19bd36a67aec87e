//! 2D geometry operations
//!
//! Polygons are slices of [`Vec2`] points, implicitly closed. With the
//! `(x, -z)` top view projection a positive signed area means counter
//! clockwise.

use glam::Vec2;

/// Signed area of a polygon (shoelace formula). Positive when counter clockwise.
pub fn signed_area_2d(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        area += p.x * next.y - next.x * p.y;
    }
    area * 0.5
}

/// Orientation of the triangle (a, b, c): positive for a left turn,
/// negative for a right turn and zero when collinear.
#[inline]
pub fn orientation_2d(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - b)
}

/// Even-odd point in polygon test. Points exactly on an edge may be
/// reported either way; use [`point_inside_or_on_polygon`] when it matters.
pub fn point_inside_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];
        let crosses = (p1.y <= point.y && point.y < p2.y) || (p2.y <= point.y && point.y < p1.y);
        if crosses && point.x < (p2.x - p1.x) * (point.y - p1.y) / (p2.y - p1.y) + p1.x {
            inside = !inside;
        }
    }
    inside
}

/// Point in polygon test where points lying on an edge count as inside
pub fn point_inside_or_on_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    let on_edge = (0..n).any(|i| {
        squared_segment_distance_2d(point, polygon[i], polygon[(i + 1) % n]) == 0.0
    });
    on_edge || point_inside_polygon(point, polygon)
}

/// Closest point to `point` on segment [a, b]
pub fn closest_point_on_segment_2d(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq == 0.0 {
        return a;
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Squared distance between a point and segment [a, b]
#[inline]
pub fn squared_segment_distance_2d(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    point.distance_squared(closest_point_on_segment_2d(point, a, b))
}

fn on_segment(a: Vec2, p: Vec2, b: Vec2) -> bool {
    p.x <= a.x.max(b.x) && p.x >= a.x.min(b.x) && p.y <= a.y.max(b.y) && p.y >= a.y.min(b.y)
}

/// Checks if segments [a1, a2] and [b1, b2] share at least one point
pub fn segments_intersect_2d(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let o1 = orientation_2d(a1, a2, b1);
    let o2 = orientation_2d(a1, a2, b2);
    let o3 = orientation_2d(b1, b2, a1);
    let o4 = orientation_2d(b1, b2, a2);

    if o1 * o2 < 0.0 && o3 * o4 < 0.0 {
        return true;
    }
    (o1 == 0.0 && on_segment(a1, b1, a2))
        || (o2 == 0.0 && on_segment(a1, b2, a2))
        || (o3 == 0.0 && on_segment(b1, a1, b2))
        || (o4 == 0.0 && on_segment(b1, a2, b2))
}

/// Intersection of the infinite lines through `p1` with direction `d1` and
/// through `p2` with direction `d2`. `None` when the lines are parallel.
pub fn line_intersection_2d(p1: Vec2, d1: Vec2, p2: Vec2, d2: Vec2) -> Option<Vec2> {
    let denominator = d1.perp_dot(d2);
    if denominator.abs() <= f32::EPSILON * d1.length() * d2.length() {
        return None;
    }
    let t = (p2 - p1).perp_dot(d2) / denominator;
    Some(p1 + d1 * t)
}

/// Convex hull of a point set (Andrew's monotone chain), counter clockwise,
/// collinear points removed. Returns fewer than 3 points for degenerate input.
pub fn convex_hull_2d(points: &[Vec2]) -> Vec<Vec2> {
    let mut sorted: Vec<Vec2> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Vec2> = Vec::with_capacity(sorted.len() * 2);
    for p in sorted.iter().copied() {
        while hull.len() >= 2 && orientation_2d(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for p in sorted.iter().rev().skip(1).copied() {
        while hull.len() >= lower_len
            && orientation_2d(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}
