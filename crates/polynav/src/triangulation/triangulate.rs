use std::collections::HashMap;
use std::fmt::Write;

use glam::Vec2;
use log::error;
use polynav_common::{signed_area_2d, Error, Result};

use super::monotone::edge_id;
use super::{MonotonePolygon, MonotonePolygonAlgorithm};
use crate::{NavTriangle, NavTriangleRef};

#[derive(Debug, Clone, Copy)]
struct SidedPoint {
    point_index: usize,
    on_left: bool,
}

/// Working buffers of one triangulation run
#[derive(Default)]
struct TriangulationState {
    triangles: Vec<NavTriangle>,
    monotone_start: usize,
    missing_triangle_neighbor: usize,
    /// Edge id of a monotone diagonal -> (triangle index, edge index)
    shared_monotone_edges: HashMap<u64, (usize, usize)>,
}

/// Triangulates a simple polygon with holes.
///
/// Produced triangles have CCW indices into [`Self::all_points`] and
/// standard links between neighbors. Link targets use polygon index 0
/// until the triangles are attached to a navigation mesh.
#[derive(Debug, Clone)]
pub struct TriangulationAlgorithm {
    polygon_points: Vec<Vec2>,
    end_contour_indices: Vec<usize>,
    contour_names: Vec<String>,
}

impl TriangulationAlgorithm {
    /// Points must be unique and in counter clockwise order
    pub fn new(ccw_polygon_points: Vec<Vec2>, name: impl Into<String>) -> Self {
        let algorithm = Self {
            end_contour_indices: vec![ccw_polygon_points.len()],
            polygon_points: ccw_polygon_points,
            contour_names: vec![name.into()],
        };

        #[cfg(debug_assertions)]
        {
            let area = signed_area_2d(&algorithm.polygon_points);
            if area < 0.0 {
                algorithm.log_input_data(&format!(
                    "Triangulation input points not in CCW order. Area: {area}"
                ));
            }
        }

        algorithm
    }

    /// Adds a hole in clockwise order, fully inside the polygon contour.
    /// Returns the hole index.
    pub fn add_hole_points(&mut self, cw_hole_points: &[Vec2], hole_name: impl Into<String>) -> usize {
        self.polygon_points.extend_from_slice(cw_hole_points);
        self.end_contour_indices.push(self.polygon_points.len());
        self.contour_names.push(hole_name.into());

        if cfg!(debug_assertions) && signed_area_2d(cw_hole_points) > 0.0 {
            self.log_input_data("Triangulation hole input points not in CW order");
        }

        self.end_contour_indices.len() - 2
    }

    /// Points of the outer contour in counter clockwise order
    pub fn polygon_points(&self) -> &[Vec2] {
        &self.polygon_points[..self.end_contour_indices[0]]
    }

    pub fn holes_len(&self) -> usize {
        self.end_contour_indices.len() - 1
    }

    /// Points of a hole in clockwise order
    pub fn hole_points(&self, hole_index: usize) -> &[Vec2] {
        &self.polygon_points
            [self.end_contour_indices[hole_index]..self.end_contour_indices[hole_index + 1]]
    }

    /// Contour points followed by the points of every hole
    pub fn all_points(&self) -> &[Vec2] {
        &self.polygon_points
    }

    pub fn triangulate(&self) -> Result<Vec<NavTriangle>> {
        if self.end_contour_indices[0] < 3 {
            let message = format!(
                "Triangulation requires at least 3 contour points, got {}",
                self.end_contour_indices[0]
            );
            self.log_input_data(&message);
            return Err(Error::GeometricDegeneracy(message));
        }
        if cfg!(debug_assertions) {
            self.check_duplicate_points();
        }

        let monotone_polygons = MonotonePolygonAlgorithm::new(
            &self.polygon_points,
            &self.end_contour_indices,
            &self.contour_names,
        )
        .create_y_monotone_polygons()?;

        let mut state = TriangulationState {
            triangles: Vec::with_capacity(
                (self.polygon_points.len() - 2) + 2 * self.holes_len(),
            ),
            ..Default::default()
        };
        for monotone_polygon in &monotone_polygons {
            self.triangulate_monotone_polygon(monotone_polygon, &mut state);
        }

        if !state.shared_monotone_edges.is_empty() {
            self.log_output_data(
                &format!(
                    "Missing neighbors ({}) between monotone polygons",
                    state.shared_monotone_edges.len()
                ),
                &state.triangles,
            );
        }

        Ok(state.triangles)
    }

    fn triangulate_monotone_polygon(&self, monotone_polygon: &MonotonePolygon, state: &mut TriangulationState) {
        state.monotone_start = state.triangles.len();
        state.missing_triangle_neighbor = 0;

        let sorted_sided_points = self.build_sorted_sided_points(monotone_polygon.ccw_points());
        let last = sorted_sided_points.len() - 1;

        let mut stack = vec![sorted_sided_points[0], sorted_sided_points[1]];
        for j in 2..last {
            let current_point = sorted_sided_points[j];
            let top_on_left = stack.last().map_or(current_point.on_left, |top| top.on_left);

            if current_point.on_left != top_on_left {
                while stack.len() > 1 {
                    let (top, top2) = pop_with_next(&mut stack);
                    self.add_triangle(
                        state,
                        monotone_polygon,
                        current_point.point_index,
                        top.point_index,
                        top2.point_index,
                    );
                }
                stack.clear();
                stack.push(sorted_sided_points[j - 1]);
                stack.push(current_point);
            } else {
                while stack.len() > 1 {
                    let top = stack[stack.len() - 1];
                    let top2 = stack[stack.len() - 2];

                    let top2_point = self.polygon_points[top2.point_index];
                    let diagonal_vector = top2_point - self.polygon_points[current_point.point_index];
                    let stack_vector = top2_point - self.polygon_points[top.point_index];
                    // can be zero when current and top points are very close
                    let orientation = diagonal_vector.perp_dot(stack_vector);

                    if (orientation <= 0.0 && top.on_left) || (orientation >= 0.0 && !top.on_left) {
                        self.add_triangle(
                            state,
                            monotone_polygon,
                            current_point.point_index,
                            top2.point_index,
                            top.point_index,
                        );
                        stack.pop();
                    } else {
                        break;
                    }
                }
                stack.push(current_point);
            }
        }

        let current_point = sorted_sided_points[last];
        while stack.len() > 1 {
            let (top, top2) = pop_with_next(&mut stack);
            self.add_triangle(
                state,
                monotone_polygon,
                current_point.point_index,
                top2.point_index,
                top.point_index,
            );
        }

        if state.missing_triangle_neighbor != 0 {
            self.log_output_data(
                &format!(
                    "Missing neighbors ({}) on monotone polygon",
                    state.missing_triangle_neighbor
                ),
                &state.triangles[state.monotone_start..],
            );
        }
    }

    fn build_sorted_sided_points(&self, monotone_points: &[usize]) -> Vec<SidedPoint> {
        let mut sorted_sided_points: Vec<SidedPoint> = monotone_points
            .iter()
            .enumerate()
            .map(|(i, &current_index)| {
                let next_index = monotone_points[(i + 1) % monotone_points.len()];
                SidedPoint {
                    point_index: current_index,
                    on_left: self.is_first_point_above_second(current_index, next_index),
                }
            })
            .collect();

        sorted_sided_points.sort_by(|left, right| {
            if self.is_first_point_above_second(left.point_index, right.point_index) {
                std::cmp::Ordering::Less
            } else if self.is_first_point_above_second(right.point_index, left.point_index) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });
        sorted_sided_points
    }

    fn is_first_point_above_second(&self, first_index: usize, second_index: usize) -> bool {
        let first = self.polygon_points[first_index];
        let second = self.polygon_points[second_index];
        if first.y == second.y {
            return first.x < second.x;
        }
        first.y > second.y
    }

    fn add_triangle(&self, state: &mut TriangulationState, monotone_polygon: &MonotonePolygon, i1: usize, i2: usize, i3: usize) {
        if i1 == i2 || i1 == i3 || i2 == i3 {
            self.log_input_data("Triangulation create navigation triangle with identical indices");
        }
        state.triangles.push(self.build_ccw_oriented_triangle(i1, i2, i3));
        Self::determine_neighbors_inside_monotone(state);
        Self::determine_neighbors_between_monotones(state, monotone_polygon);
    }

    fn build_ccw_oriented_triangle(&self, i1: usize, i2: usize, i3: usize) -> NavTriangle {
        let p1 = self.polygon_points[i1].as_dvec2();
        let p2 = self.polygon_points[i2].as_dvec2();
        let p3 = self.polygon_points[i3].as_dvec2();

        if (p2 - p1).perp_dot(p3 - p2) > 0.0 {
            NavTriangle::new(i1, i2, i3)
        } else {
            NavTriangle::new(i2, i1, i3)
        }
    }

    fn determine_neighbors_inside_monotone(state: &mut TriangulationState) {
        let current = state.triangles.len() - 1;
        if current > state.monotone_start {
            // the first triangle of a monotone polygon has no neighbor yet
            state.missing_triangle_neighbor += 1;
        }

        let mut previous = current;
        while previous > state.monotone_start && state.missing_triangle_neighbor > 0 {
            previous -= 1;

            for (previous_edge_index, edge_index) in [(2, 0), (0, 1), (1, 2)] {
                if state.missing_triangle_neighbor == 0 {
                    break;
                }
                let previous_triangle = &state.triangles[previous];
                let current_triangle = &state.triangles[current];
                let matching_edge = [(0, 1), (1, 2), (2, 0)].iter().position(|&(c1, c2)| {
                    are_same_edge(
                        previous_triangle,
                        previous_edge_index,
                        edge_index,
                        current_triangle,
                        c1,
                        c2,
                    )
                });

                if let Some(current_edge_index) = matching_edge {
                    state.triangles[current]
                        .add_standard_link(current_edge_index, NavTriangleRef::new(0, previous));
                    state.triangles[previous]
                        .add_standard_link(previous_edge_index, NavTriangleRef::new(0, current));
                    state.missing_triangle_neighbor -= 1;
                }
            }
        }
    }

    fn determine_neighbors_between_monotones(state: &mut TriangulationState, monotone_polygon: &MonotonePolygon) {
        let current = state.triangles.len() - 1;

        for (previous_edge_index, edge_index) in [(2, 0), (0, 1), (1, 2)] {
            let current_triangle = &state.triangles[current];
            if current_triangle.has_edge_links(previous_edge_index) {
                continue;
            }

            let edge_start = current_triangle.index(previous_edge_index);
            let edge_end = current_triangle.index(edge_index);
            if !monotone_polygon.is_shared_edge(edge_start, edge_end) {
                continue;
            }

            let id = edge_id(edge_start, edge_end);
            match state.shared_monotone_edges.remove(&id) {
                None => {
                    state
                        .shared_monotone_edges
                        .insert(id, (current, previous_edge_index));
                }
                Some((neighbor, neighbor_edge_index)) => {
                    state.triangles[current]
                        .add_standard_link(previous_edge_index, NavTriangleRef::new(0, neighbor));
                    state.triangles[neighbor]
                        .add_standard_link(neighbor_edge_index, NavTriangleRef::new(0, current));
                }
            }
        }
    }

    fn check_duplicate_points(&self) {
        for (i, point) in self.polygon_points.iter().enumerate() {
            if let Some(j) = self.polygon_points[i + 1..].iter().position(|p| p == point) {
                self.log_input_data(&format!(
                    "Triangulation point {} duplicates the point {}",
                    i,
                    i + 1 + j
                ));
            }
        }
    }

    fn log_input_data(&self, message: &str) {
        let mut dump = String::new();
        let _ = writeln!(dump, "{message}");
        let _ = writeln!(dump, "Polygon points:");
        for point in &self.polygon_points {
            let _ = writeln!(dump, " - {} {}", point.x, point.y);
        }
        let _ = writeln!(dump, "Contour names:");
        for name in &self.contour_names {
            let _ = writeln!(dump, " - {name}");
        }
        let _ = writeln!(dump, "End contour indices:");
        for end_contour_index in &self.end_contour_indices {
            let _ = writeln!(dump, " - {end_contour_index}");
        }
        error!("{dump}");
    }

    fn log_output_data(&self, message: &str, triangles: &[NavTriangle]) {
        let mut dump = String::new();
        let _ = writeln!(dump, "{message}");
        let _ = writeln!(dump, "Monotone polygon triangles output data:");
        for triangle in triangles {
            let [i1, i2, i3] = triangle.indices();
            let _ = writeln!(
                dump,
                " - {{{i1}: {}}}, {{{i2}: {}}}, {{{i3}: {}}}",
                self.polygon_points[i1], self.polygon_points[i2], self.polygon_points[i3]
            );
        }
        error!("{dump}");
    }
}

/// Pops the top of the stack and returns it with the new top
fn pop_with_next(stack: &mut Vec<SidedPoint>) -> (SidedPoint, SidedPoint) {
    let top = stack[stack.len() - 1];
    stack.pop();
    (top, stack[stack.len() - 1])
}

fn are_same_edge(triangle1: &NavTriangle, t1_point1: usize, t1_point2: usize, triangle2: &NavTriangle, t2_point1: usize, t2_point2: usize) -> bool {
    let (a1, a2) = (triangle1.index(t1_point1), triangle1.index(t1_point2));
    let (b1, b2) = (triangle2.index(t2_point1), triangle2.index(t2_point2));
    (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1)
}
