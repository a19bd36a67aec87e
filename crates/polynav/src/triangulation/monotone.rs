use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

use glam::{DVec2, Vec2};
use log::error;
use polynav_common::{Error, Result};

/// Classification of a polygon vertex for the monotone sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointType {
    Start,
    Split,
    End,
    Merge,
    RegularDown,
    RegularUp,
}

/// Y-monotone piece of a polygon: indices of the source points in CCW order
/// and the diagonals it shares with other pieces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonotonePolygon {
    ccw_points: Vec<usize>,
    shared_edges: HashSet<u64>,
}

impl MonotonePolygon {
    pub fn ccw_points(&self) -> &[usize] {
        &self.ccw_points
    }

    pub fn shared_edges_len(&self) -> usize {
        self.shared_edges.len()
    }

    pub fn is_shared_edge(&self, edge_start: usize, edge_end: usize) -> bool {
        self.shared_edges.contains(&edge_id(edge_start, edge_end))
    }

    fn add_shared_edge(&mut self, edge_start: usize, edge_end: usize) {
        self.shared_edges.insert(edge_id(edge_start, edge_end));
    }
}

/// Orientation independent identifier of an edge
pub(crate) fn edge_id(edge_start: usize, edge_end: usize) -> u64 {
    ((edge_start.min(edge_end) as u64) << 32) + edge_start.max(edge_end) as u64
}

#[derive(Debug, Clone, Copy)]
struct TypedPoint {
    point_index: usize,
    point_type: PointType,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    start_index: usize,
    end_index: usize,
}

#[derive(Debug, Clone, Copy)]
struct EdgeHelper {
    edge: Edge,
    helper_point_index: usize,
    helper_point_type: PointType,
}

#[derive(Debug, Clone, Copy)]
struct Diagonal {
    start_index: usize,
    end_index: usize,
    processed: bool,
}

/// Position of a diagonal in the diagonal multimap
type DiagonalKey = (usize, usize);

/// Splits a polygon with holes into y-monotone polygons.
///
/// Points of the outer contour are in CCW order, followed by the points of
/// each hole in CW order. `end_contour_indices` holds the exclusive end of
/// each contour in `polygon_points`.
pub struct MonotonePolygonAlgorithm<'a> {
    polygon_points: &'a [Vec2],
    end_contour_indices: &'a [usize],
    contour_names: &'a [String],

    edge_helpers: Vec<EdgeHelper>,
    diagonals: BTreeMap<usize, Vec<Diagonal>>,
    monotone_polygons: Vec<MonotonePolygon>,
}

impl<'a> MonotonePolygonAlgorithm<'a> {
    pub fn new(polygon_points: &'a [Vec2], end_contour_indices: &'a [usize], contour_names: &'a [String]) -> Self {
        Self {
            polygon_points,
            end_contour_indices,
            contour_names,
            edge_helpers: Vec::with_capacity(5),
            diagonals: BTreeMap::new(),
            monotone_polygons: Vec::new(),
        }
    }

    /// Creates y-monotone polygons: any horizontal line intersects such a
    /// polygon at most once (point or segment)
    pub fn create_y_monotone_polygons(mut self) -> Result<Vec<MonotonePolygon>> {
        if let Err(err) = self.create_y_monotone_polygons_diagonals() {
            self.log_input_data(&err.to_string());
            return Err(err);
        }

        if self.diagonals.is_empty() {
            return Ok(vec![MonotonePolygon {
                ccw_points: (0..self.polygon_points.len()).collect(),
                shared_edges: HashSet::new(),
            }]);
        }

        let keys: Vec<usize> = self.diagonals.keys().copied().collect();
        for key in keys {
            let diagonals_len = self.diagonals.get(&key).map_or(0, Vec::len);
            for position in 0..diagonals_len {
                let start_diagonal = self.diagonals[&key][position];
                if start_diagonal.processed {
                    continue;
                }

                let monotone_index = self.monotone_polygons.len();
                self.monotone_polygons.push(MonotonePolygon::default());

                let mut monotone_points = Vec::with_capacity(self.polygon_points.len() / 2 + 1);
                monotone_points.push(start_diagonal.start_index);
                monotone_points.push(start_diagonal.end_index);

                let mut previous_point_index = start_diagonal.start_index;
                let mut current_point_index = start_diagonal.end_index;
                loop {
                    let next_point_index =
                        self.retrieve_next_point_index(previous_point_index, current_point_index, monotone_index);
                    if next_point_index == start_diagonal.start_index {
                        break;
                    }

                    if monotone_points.contains(&next_point_index) {
                        self.log_input_data(&format!(
                            "Duplicate point ({}) inserted in monotone polygon",
                            self.polygon_points[next_point_index]
                        ));
                    }
                    monotone_points.push(next_point_index);

                    previous_point_index = current_point_index;
                    current_point_index = next_point_index;

                    if monotone_points.len() > self.polygon_points.len() {
                        let message = "Impossible to close monotone polygon";
                        self.log_input_data(message);
                        return Err(Error::GeometricDegeneracy(message.to_string()));
                    }

                    self.mark_diagonal_processed(Some((key, position)), monotone_index);
                }

                self.monotone_polygons[monotone_index].ccw_points = monotone_points;
            }
        }

        Ok(self.monotone_polygons)
    }

    fn create_y_monotone_polygons_diagonals(&mut self) -> Result<()> {
        self.edge_helpers.clear();
        self.diagonals.clear();

        let (sorted_typed_points, is_monotone) = self.build_sorted_typed_points()?;
        if is_monotone {
            return Ok(());
        }

        for typed_point in sorted_typed_points {
            let i = typed_point.point_index;
            match typed_point.point_type {
                PointType::Start => self.handle_start_vertex(i),
                PointType::Split => self.handle_split_vertex(i)?,
                PointType::End => self.handle_end_vertex(i)?,
                PointType::Merge => self.handle_merge_vertex(i)?,
                PointType::RegularDown => self.handle_regular_down_vertex(i)?,
                PointType::RegularUp => self.handle_regular_up_vertex(i)?,
            }
        }
        Ok(())
    }

    /// Returns the points sorted from top to bottom and whether the polygon
    /// is already monotone
    fn build_sorted_typed_points(&self) -> Result<(Vec<TypedPoint>, bool)> {
        let mut sorted_typed_points = Vec::with_capacity(self.polygon_points.len());
        let mut is_monotone = true;

        for i in 0..self.polygon_points.len() {
            let previous_index = self.previous_point_index(i);
            let next_index = self.next_point_index(i);

            let above_previous = self.is_first_point_above_second(i, previous_index);
            let above_next = self.is_first_point_above_second(i, next_index);

            let point_type = if above_previous == above_next {
                let previous_to_origin = self.polygon_points[i] - self.polygon_points[previous_index];
                let origin_to_next = self.polygon_points[next_index] - self.polygon_points[i];
                let orientation = previous_to_origin.perp_dot(origin_to_next);

                match (above_previous, orientation >= 0.0) {
                    (true, true) => PointType::Start,
                    (true, false) => PointType::Split,
                    (false, true) => PointType::End,
                    (false, false) => PointType::Merge,
                }
            } else if !above_previous {
                PointType::RegularDown
            } else {
                PointType::RegularUp
            };

            if matches!(point_type, PointType::Split | PointType::Merge) {
                is_monotone = false;
            }
            sorted_typed_points.push(TypedPoint {
                point_index: i,
                point_type,
            });
        }

        sorted_typed_points.sort_by(|left, right| {
            if self.is_first_point_above_second(left.point_index, right.point_index) {
                std::cmp::Ordering::Less
            } else if self.is_first_point_above_second(right.point_index, left.point_index) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });

        if let Some(first) = sorted_typed_points.first() {
            if first.point_type != PointType::Start {
                return Err(Error::GeometricDegeneracy(format!(
                    "First point in the vector should be a start vertex. Point type: {:?}",
                    first.point_type
                )));
            }
        }

        Ok((sorted_typed_points, is_monotone))
    }

    fn is_first_point_above_second(&self, first_index: usize, second_index: usize) -> bool {
        let first = self.polygon_points[first_index];
        let second = self.polygon_points[second_index];
        if first.y == second.y {
            return first.x < second.x;
        }
        first.y > second.y
    }

    fn handle_start_vertex(&mut self, i: usize) {
        self.create_edge_helper(i, i, PointType::Start);
    }

    fn handle_split_vertex(&mut self, i: usize) -> Result<()> {
        let helper_position = self.find_nearest_left_edge_helper(i)?;
        let helper_point_index = self.edge_helpers[helper_position].helper_point_index;
        self.create_diagonals(i, helper_point_index);

        let edge_helper = &mut self.edge_helpers[helper_position];
        edge_helper.helper_point_index = i;
        edge_helper.helper_point_type = PointType::Split;

        self.create_edge_helper(i, i, PointType::Split);
        Ok(())
    }

    fn handle_end_vertex(&mut self, i: usize) -> Result<()> {
        self.close_previous_edge(i)
    }

    fn handle_merge_vertex(&mut self, i: usize) -> Result<()> {
        self.close_previous_edge(i)?;

        let helper_position = self.find_nearest_left_edge_helper(i)?;
        self.connect_merge_helper(i, helper_position);
        let edge_helper = &mut self.edge_helpers[helper_position];
        edge_helper.helper_point_index = i;
        edge_helper.helper_point_type = PointType::Merge;
        Ok(())
    }

    fn handle_regular_down_vertex(&mut self, i: usize) -> Result<()> {
        self.close_previous_edge(i)?;
        self.create_edge_helper(i, i, PointType::RegularDown);
        Ok(())
    }

    fn handle_regular_up_vertex(&mut self, i: usize) -> Result<()> {
        let helper_position = self.find_nearest_left_edge_helper(i)?;
        self.connect_merge_helper(i, helper_position);
        let edge_helper = &mut self.edge_helpers[helper_position];
        edge_helper.helper_point_index = i;
        edge_helper.helper_point_type = PointType::RegularUp;
        Ok(())
    }

    /// Removes the helper of the edge ending at `i`, connecting `i` to it
    /// when that helper is a merge vertex
    fn close_previous_edge(&mut self, i: usize) -> Result<()> {
        let previous_edge_index = self.previous_point_index(i);
        let helper_position = self.find_edge_helper(previous_edge_index)?;
        self.connect_merge_helper(i, helper_position);
        self.edge_helpers.swap_remove(helper_position);
        Ok(())
    }

    fn connect_merge_helper(&mut self, i: usize, helper_position: usize) {
        let edge_helper = self.edge_helpers[helper_position];
        if edge_helper.helper_point_type == PointType::Merge {
            self.create_diagonals(i, edge_helper.helper_point_index);
        }
    }

    fn next_point_index(&self, point_index: usize) -> usize {
        let next_index = point_index + 1;
        match self
            .end_contour_indices
            .iter()
            .position(|&end| end == next_index)
        {
            Some(0) => 0,
            Some(position) => self.end_contour_indices[position - 1],
            None => next_index,
        }
    }

    fn previous_point_index(&self, point_index: usize) -> usize {
        if point_index == 0 {
            return self.end_contour_indices[0] - 1;
        }
        match self
            .end_contour_indices
            .iter()
            .position(|&end| end == point_index)
        {
            Some(position) => self.end_contour_indices[position + 1] - 1,
            None => point_index - 1,
        }
    }

    fn create_edge_helper(&mut self, edge_start_index: usize, helper_point_index: usize, point_type: PointType) {
        let edge = Edge {
            start_index: edge_start_index,
            end_index: self.next_point_index(edge_start_index),
        };
        self.edge_helpers.push(EdgeHelper {
            edge,
            helper_point_index,
            helper_point_type: point_type,
        });
    }

    fn find_edge_helper(&self, edge_index: usize) -> Result<usize> {
        self.edge_helpers
            .iter()
            .position(|helper| helper.edge.start_index == edge_index)
            .ok_or_else(|| {
                Error::GeometricDegeneracy(format!(
                    "Impossible to find edge and his helper for edge index: {edge_index}"
                ))
            })
    }

    fn find_nearest_left_edge_helper(&self, point_index: usize) -> Result<usize> {
        let point = self.polygon_points[point_index].as_dvec2();

        let mut nearest_distance = -f64::MAX;
        let mut nearest_position = None;
        for (position, helper) in self.edge_helpers.iter().enumerate() {
            let a = self.polygon_points[helper.edge.start_index].as_dvec2();
            let b = self.polygon_points[helper.edge.end_index].as_dvec2();

            let distance = horizontal_distance(a, b, point);
            if distance < 0.0 && distance > nearest_distance {
                nearest_distance = distance;
                nearest_position = Some(position);
            }
        }

        nearest_position.ok_or_else(|| {
            Error::GeometricDegeneracy(format!(
                "Impossible to find edge on left for point index: {point_index}"
            ))
        })
    }

    fn create_diagonals(&mut self, index1: usize, index2: usize) {
        self.diagonals.entry(index1).or_default().push(Diagonal {
            start_index: index1,
            end_index: index2,
            processed: false,
        });
        self.diagonals.entry(index2).or_default().push(Diagonal {
            start_index: index2,
            end_index: index1,
            processed: false,
        });
    }

    /// Returns the point following edge `[edge_start, edge_end]` on the
    /// boundary of the current monotone polygon. A diagonal taken to reach
    /// it is marked as processed.
    fn retrieve_next_point_index(&mut self, edge_start_index: usize, edge_end_index: usize, monotone_index: usize) -> usize {
        let possible_next_points = self.retrieve_possible_next_points(edge_end_index);
        if possible_next_points.len() == 1 {
            let (point_index, diagonal) = possible_next_points[0];
            self.mark_diagonal_processed(diagonal, monotone_index);
            return point_index;
        }

        let mut best_ccw = None;
        let mut best_cw = None;
        let mut min_angle_ccw = f64::MAX;
        let mut max_angle_cw = -f64::MAX;

        let edge_end = self.polygon_points[edge_end_index].as_dvec2();
        let edge_vector = edge_end - self.polygon_points[edge_start_index].as_dvec2();
        for (i, &(test_point_index, _)) in possible_next_points.iter().enumerate() {
            let next_edge_vector = self.polygon_points[test_point_index].as_dvec2() - edge_end;
            let orientation = edge_vector.perp_dot(next_edge_vector);
            let angle = edge_vector
                .normalize_or_zero()
                .dot(next_edge_vector.normalize_or_zero());

            if orientation > 0.0 {
                if angle < min_angle_ccw {
                    min_angle_ccw = angle;
                    best_ccw = Some(i);
                }
            } else if angle > max_angle_cw {
                max_angle_cw = angle;
                best_cw = Some(i);
            }
        }

        let (point_index, diagonal) = possible_next_points[best_ccw.or(best_cw).unwrap_or(0)];
        self.mark_diagonal_processed(diagonal, monotone_index);
        point_index
    }

    fn retrieve_possible_next_points(&self, edge_end_index: usize) -> Vec<(usize, Option<DiagonalKey>)> {
        let mut possible_next_points = vec![(self.next_point_index(edge_end_index), None)];
        if let Some(diagonals) = self.diagonals.get(&edge_end_index) {
            for (position, diagonal) in diagonals.iter().enumerate() {
                if !diagonal.processed {
                    possible_next_points.push((diagonal.end_index, Some((edge_end_index, position))));
                }
            }
        }
        possible_next_points
    }

    fn mark_diagonal_processed(&mut self, diagonal_key: Option<DiagonalKey>, monotone_index: usize) {
        let Some((key, position)) = diagonal_key else {
            return;
        };
        if let Some(diagonal) = self
            .diagonals
            .get_mut(&key)
            .and_then(|diagonals| diagonals.get_mut(position))
        {
            diagonal.processed = true;
            let (start, end) = (diagonal.start_index, diagonal.end_index);
            self.monotone_polygons[monotone_index].add_shared_edge(start, end);
        }
    }

    fn log_input_data(&self, message: &str) {
        let mut dump = String::new();
        let mut contour_index = 0;
        let _ = writeln!(dump, "{message}");
        let _ = writeln!(dump, "Monotone polygon input data:");
        let _ = writeln!(dump, "\tPoints ({}):", self.contour_name(contour_index));
        for (i, point) in self.polygon_points.iter().enumerate() {
            let _ = writeln!(dump, "\t\t{} {}", point.x, point.y);
            if i + 1 != self.polygon_points.len() && self.end_contour_indices.contains(&(i + 1)) {
                contour_index += 1;
                let _ = writeln!(dump, "\tHole ({}):", self.contour_name(contour_index));
            }
        }
        error!("{dump}");
    }

    fn contour_name(&self, contour_index: usize) -> &str {
        self.contour_names
            .get(contour_index)
            .map_or("unnamed", String::as_str)
    }
}

/// Signed horizontal distance from `point` to the line `(a, b)`: negative
/// when the line is on the left of the point
fn horizontal_distance(a: DVec2, b: DVec2, point: DVec2) -> f64 {
    let ab = b - a;
    let normal = DVec2::new(-ab.y, ab.x);
    normal.dot(a - point) / normal.x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monotone_polygons(points: &[(f32, f32)], end_contour_indices: &[usize]) -> Vec<MonotonePolygon> {
        let points: Vec<Vec2> = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
        let names = vec!["test".to_string(); end_contour_indices.len()];
        MonotonePolygonAlgorithm::new(&points, end_contour_indices, &names)
            .create_y_monotone_polygons()
            .unwrap()
    }

    #[test]
    fn test_single_triangle() {
        let polygons = monotone_polygons(&[(-1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)], &[3]);

        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].ccw_points(), &[0, 1, 2]);
        assert_eq!(polygons[0].shared_edges_len(), 0);
    }

    #[test]
    fn test_one_split_vertex() {
        let polygons = monotone_polygons(&[(1.0, 2.0), (0.0, 0.0), (1.0, 1.0), (2.0, 0.0)], &[4]);

        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].ccw_points(), &[0, 2, 3]);
        assert_eq!(polygons[0].shared_edges_len(), 1);
        assert!(polygons[0].is_shared_edge(2, 0));
        assert_eq!(polygons[1].ccw_points(), &[2, 0, 1]);
        assert_eq!(polygons[1].shared_edges_len(), 1);
    }

    #[test]
    fn test_two_split_vertex() {
        let polygons = monotone_polygons(
            &[(1.0, 3.0), (0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0), (4.0, 0.0), (3.0, 3.0)],
            &[7],
        );

        assert_eq!(polygons.len(), 3);
        assert_eq!(polygons[0].ccw_points(), &[2, 6, 0, 1]);
        assert_eq!(polygons[0].shared_edges_len(), 1);
        assert_eq!(polygons[1].ccw_points(), &[2, 4, 5, 6]);
        assert_eq!(polygons[1].shared_edges_len(), 2);
        assert_eq!(polygons[2].ccw_points(), &[4, 2, 3]);
        assert_eq!(polygons[2].shared_edges_len(), 1);
    }

    #[test]
    fn test_one_merge_vertex() {
        let polygons = monotone_polygons(&[(0.0, 2.0), (1.0, 0.0), (2.0, 2.0), (1.0, 1.0)], &[4]);

        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].ccw_points(), &[1, 3, 0]);
        assert_eq!(polygons[1].ccw_points(), &[3, 1, 2]);
        assert_eq!(polygons[1].shared_edges_len(), 1);
    }

    #[test]
    fn test_two_regular_vertex() {
        let polygons = monotone_polygons(&[(0.0, 2.0), (1.0, 1.0), (0.0, 0.0), (2.0, 1.0)], &[4]);

        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].ccw_points(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_split_and_merge_vertex() {
        let polygons = monotone_polygons(
            &[(0.0, 3.0), (0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (2.0, 3.0), (1.0, 2.0)],
            &[6],
        );

        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].ccw_points(), &[2, 5, 0, 1]);
        assert_eq!(polygons[1].ccw_points(), &[5, 2, 3, 4]);
        assert!(polygons[1].is_shared_edge(2, 5));
    }

    #[test]
    fn test_polygon_one_hole() {
        let polygons = monotone_polygons(
            &[
                (0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0),
                (1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0),
            ],
            &[4, 8],
        );

        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].ccw_points(), &[0, 7, 4, 5, 2, 3]);
        assert_eq!(polygons[0].shared_edges_len(), 2);
        assert_eq!(polygons[1].ccw_points(), &[2, 5, 6, 7, 0, 1]);
        assert_eq!(polygons[1].shared_edges_len(), 2);
    }

    #[test]
    fn test_polygon_two_holes() {
        let polygons = monotone_polygons(
            &[
                (0.0, 0.0), (5.0, 0.0), (5.0, 5.0), (0.0, 5.0),
                (1.0, 1.0), (2.0, 2.0), (2.0, 1.0),
                (4.0, 3.0), (3.0, 4.0), (4.0, 4.0),
            ],
            &[4, 7, 10],
        );

        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].ccw_points(), &[0, 6, 4, 5, 7, 8, 2, 3]);
        assert_eq!(polygons[1].ccw_points(), &[2, 8, 9, 7, 5, 6, 0, 1]);
    }

    #[test]
    fn test_hole_contour_navigation() {
        let points = [Vec2::ZERO; 10];
        let names = vec![String::new(); 3];
        let algorithm = MonotonePolygonAlgorithm::new(&points, &[4, 7, 10], &names);

        assert_eq!(algorithm.next_point_index(3), 0);
        assert_eq!(algorithm.next_point_index(6), 4);
        assert_eq!(algorithm.next_point_index(9), 7);
        assert_eq!(algorithm.previous_point_index(0), 3);
        assert_eq!(algorithm.previous_point_index(4), 6);
        assert_eq!(algorithm.previous_point_index(7), 9);
        assert_eq!(algorithm.previous_point_index(5), 4);
    }

    #[test]
    fn test_degenerate_input_is_reported() {
        // clockwise contour: the topmost point is not a start vertex
        let points: Vec<Vec2> = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]
            .iter()
            .map(|&(x, y)| Vec2::new(x, y))
            .collect();
        let names = vec!["cw".to_string()];
        let result = MonotonePolygonAlgorithm::new(&points, &[4], &names).create_y_monotone_polygons();

        assert!(matches!(result, Err(Error::GeometricDegeneracy(_))));
    }
}
