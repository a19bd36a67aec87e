use glam::Vec2;
use polynav_common::{
    line_intersection_2d, point_inside_or_on_polygon, point_inside_polygon, segments_intersect_2d,
    signed_area_2d,
};
use serde::{Deserialize, Serialize};

/// Self intersections are only searched on polygons smaller than this
const MAX_POINTS_INTERSECTION_CHECK: usize = 20;

/// Named simple polygon with points in clockwise order, seen in the `(x, -z)`
/// top view. Holes are never part of a polygon: they are separate polygons
/// combined with boolean operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CSGPolygon {
    name: String,
    cw_points: Vec<Vec2>,
}

impl CSGPolygon {
    pub fn new(name: impl Into<String>, cw_points: Vec<Vec2>) -> Self {
        let polygon = Self {
            name: name.into(),
            cw_points,
        };
        #[cfg(debug_assertions)]
        polygon.log_invalid_points("polygon created");
        polygon
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cw_points(&self) -> &[Vec2] {
        &self.cw_points
    }

    pub fn into_cw_points(self) -> Vec<Vec2> {
        self.cw_points
    }

    /// Points in counter clockwise order
    pub fn ccw_points(&self) -> Vec<Vec2> {
        self.cw_points.iter().rev().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.cw_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cw_points.is_empty()
    }

    pub fn compute_area(&self) -> f32 {
        signed_area_2d(&self.cw_points).abs()
    }

    pub fn point_inside_polygon(&self, point: Vec2) -> bool {
        point_inside_polygon(point, &self.cw_points)
    }

    pub fn point_inside_or_on_polygon(&self, point: Vec2) -> bool {
        point_inside_or_on_polygon(point, &self.cw_points)
    }

    /// Checks the polygon invariant: no duplicate point, clockwise order and,
    /// for small polygons, no intersection between non adjacent edges.
    pub fn is_cw_points(&self) -> bool {
        is_cw_points(&self.cw_points)
    }

    /// Removes superfluous points.
    ///
    /// `angle_threshold` is the cosine above which two consecutive edges are
    /// considered aligned (1.0 only removes exactly aligned points).
    /// `distance_threshold` is the distance under which points are merged.
    /// The polygon is emptied when fewer than three points remain.
    pub fn simplify(&mut self, angle_threshold: f32, distance_threshold: f32) {
        let max_iterations = self.cw_points.len() * 2 + 1;
        let mut iteration = 0;
        loop {
            self.merge_close_successors(distance_threshold);
            self.remove_aligned_points(angle_threshold);
            if !self.separate_close_points(distance_threshold) {
                break;
            }

            iteration += 1;
            if iteration >= max_iterations {
                log::error!(
                    "Simplification of polygon {} does not converge: {:?}",
                    self.name,
                    self.cw_points
                );
                break;
            }
        }

        if self.cw_points.len() < 3 {
            self.cw_points.clear();
        }

        #[cfg(debug_assertions)]
        self.log_invalid_points("polygon simplified");
    }

    fn merge_close_successors(&mut self, distance_threshold: f32) {
        let distance_threshold_sq = distance_threshold * distance_threshold;
        let mut i = 0;
        while i < self.cw_points.len() {
            while self.cw_points.len() > 1 {
                let next = (i + 1) % self.cw_points.len();
                if self.cw_points[i].distance_squared(self.cw_points[next]) >= distance_threshold_sq {
                    break;
                }
                self.cw_points.remove(next);
                if next < i {
                    i -= 1;
                }
            }
            i += 1;
        }
    }

    fn remove_aligned_points(&mut self, angle_threshold: f32) {
        let mut i = 0;
        while i < self.cw_points.len() && self.cw_points.len() >= 3 {
            let n = self.cw_points.len();
            let previous = self.cw_points[(i + n - 1) % n];
            let current = self.cw_points[i];
            let next = self.cw_points[(i + 1) % n];

            let incoming = (current - previous).normalize_or_zero();
            let outgoing = (next - current).normalize_or_zero();
            if incoming.dot(outgoing).abs() >= angle_threshold {
                self.cw_points.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Moves or deletes the first point of a non adjacent pair of close points.
    /// Returns true when the polygon changed.
    fn separate_close_points(&mut self, distance_threshold: f32) -> bool {
        let n = self.cw_points.len();
        if n < 4 {
            return false;
        }
        let distance_threshold_sq = distance_threshold * distance_threshold;

        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if self.cw_points[i].distance_squared(self.cw_points[j]) >= distance_threshold_sq {
                    continue;
                }

                let previous = self.cw_points[(i + n - 1) % n];
                let edge = previous - self.cw_points[i];
                if distance_threshold < edge.length() {
                    self.cw_points[i] += edge.normalize() * distance_threshold;
                } else {
                    self.cw_points.remove(i);
                }
                return true;
            }
        }
        false
    }

    /// Moves each edge along its outward normal by `distance` (negative to
    /// shrink) and rebuilds the points at the intersections of the moved edges.
    pub fn expand(&mut self, distance: f32) {
        let n = self.cw_points.len();
        if n < 3 {
            return;
        }

        let mut expanded = Vec::with_capacity(n);
        for i in 0..n {
            let previous = self.cw_points[(i + n - 1) % n];
            let current = self.cw_points[i];
            let next = self.cw_points[(i + 1) % n];

            let incoming = current - previous;
            let outgoing = next - current;
            let incoming_normal = outward_normal(incoming);
            let outgoing_normal = outward_normal(outgoing);

            let point = line_intersection_2d(
                previous + incoming_normal * distance,
                incoming,
                current + outgoing_normal * distance,
                outgoing,
            )
            .unwrap_or(current + outgoing_normal * distance);
            expanded.push(point);
        }
        self.cw_points = expanded;

        #[cfg(debug_assertions)]
        self.log_invalid_points("polygon expanded");
    }

    #[cfg(debug_assertions)]
    fn log_invalid_points(&self, context: &str) {
        if !self.cw_points.is_empty() && !self.is_cw_points() {
            log::error!(
                "Invalid points on {} ({}): {:?}",
                context,
                self.name,
                self.cw_points
            );
        }
    }
}

/// Outward normal of an edge of a clockwise polygon
fn outward_normal(edge: Vec2) -> Vec2 {
    Vec2::new(-edge.y, edge.x).normalize_or_zero()
}

/// See [`CSGPolygon::is_cw_points`]
pub fn is_cw_points(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if points[i] == points[j] {
                return false;
            }
        }
    }

    let mut area = 0.0;
    for i in 0..n {
        let next = points[(i + 1) % n];
        area += points[i].x * next.y - next.x * points[i].y;
    }
    if area >= 0.0 {
        return false;
    }

    if n < MAX_POINTS_INTERSECTION_CHECK {
        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if segments_intersect_2d(points[i], points[(i + 1) % n], points[j], points[(j + 1) % n]) {
                    return false;
                }
            }
        }
    }
    true
}
