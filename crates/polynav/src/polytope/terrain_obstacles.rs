use glam::{Vec2, Vec3};

use crate::CSGPolygon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeDirection {
    Right,
    Bottom,
    Left,
    Top,
}

impl EdgeDirection {
    /// Directions tried from a point reached with this direction: turn left,
    /// go straight, turn right. Keeps the obstacle on the right hand side.
    fn check_directions(self) -> [EdgeDirection; 3] {
        use EdgeDirection::*;
        match self {
            Right => [Top, Right, Bottom],
            Bottom => [Right, Bottom, Left],
            Left => [Bottom, Left, Top],
            Top => [Left, Top, Right],
        }
    }
}

/// Detects the terrain squares too steep to be walked on and merges the
/// connected ones into obstacle polygons.
///
/// A square is identified by the index of its far left vertex.
pub struct TerrainObstacleService<'a> {
    terrain_name: &'a str,
    position: Vec3,
    local_vertices: &'a [Vec3],
    x_length: usize,
    z_length: usize,
}

impl<'a> TerrainObstacleService<'a> {
    pub fn new(
        terrain_name: &'a str,
        position: Vec3,
        local_vertices: &'a [Vec3],
        x_length: usize,
        z_length: usize,
    ) -> Self {
        Self {
            terrain_name,
            position,
            local_vertices,
            x_length,
            z_length,
        }
    }

    /// Clockwise top view polygons of the non walkable areas, named
    /// `<terrain>_obstacle<n>`
    pub fn compute_self_obstacles(&self, max_slope: f32) -> Vec<CSGPolygon> {
        let mut obstacle_polygons = Vec::new();
        if self.x_length < 2 || self.z_length < 2 {
            return obstacle_polygons;
        }

        let max_slope_dot_product = max_slope.cos();
        let max_square_index = self.x_length * (self.z_length - 1);
        let mut squares_processed = vec![false; max_square_index];
        let mut obstacle_index = 0;

        for square_index in 0..max_square_index {
            if (square_index + 1) % self.x_length == 0 || squares_processed[square_index] {
                continue;
            }

            if !self.is_walkable_square(square_index, max_slope_dot_product) {
                let inaccessible_squares =
                    self.find_all_inaccessible_neighbors(square_index, max_slope_dot_product);
                for &square in &inaccessible_squares {
                    squares_processed[square] = true;
                }

                match self.squares_to_polygon(&inaccessible_squares, obstacle_index) {
                    Some(polygon) => {
                        obstacle_polygons.push(polygon);
                        obstacle_index += 1;
                    }
                    None => log::error!(
                        "Unable to compute the outline of {} steep squares on terrain {}",
                        inaccessible_squares.len(),
                        self.terrain_name
                    ),
                }
            }
        }

        obstacle_polygons
    }

    fn is_walkable_square(&self, square_index: usize, max_slope_dot_product: f32) -> bool {
        let far_left = self.local_vertices[square_index];
        let far_right = self.local_vertices[square_index + 1];
        let near_left = self.local_vertices[square_index + self.x_length];
        let near_right = self.local_vertices[square_index + self.x_length + 1];

        let triangle1_slope = Self::compute_triangle_slope(far_left, near_left, near_right);
        let triangle2_slope = Self::compute_triangle_slope(far_left, near_right, far_right);
        triangle1_slope.min(triangle2_slope) >= max_slope_dot_product
    }

    /// Dot product between the triangle normal and the up vector
    fn compute_triangle_slope(p0: Vec3, p1: Vec3, p2: Vec3) -> f32 {
        let normal = (p2 - p0).cross(p0 - p1).normalize_or_zero();
        normal.dot(Vec3::Y)
    }

    fn find_all_inaccessible_neighbors(
        &self,
        square_index: usize,
        max_slope_dot_product: f32,
    ) -> Vec<usize> {
        let mut inaccessible_neighbors = Vec::new();
        let mut squares_to_process = vec![square_index];

        while let Some(current) = squares_to_process.pop() {
            if inaccessible_neighbors.contains(&current) {
                continue;
            }
            inaccessible_neighbors.push(current);

            for neighbor in self.retrieve_neighbors(current) {
                if !inaccessible_neighbors.contains(&neighbor)
                    && !self.is_walkable_square(neighbor, max_slope_dot_product)
                {
                    squares_to_process.push(neighbor);
                }
            }
        }

        inaccessible_neighbors
    }

    fn retrieve_neighbors(&self, square_index: usize) -> Vec<usize> {
        let mut neighbors = Vec::with_capacity(4);
        if square_index % self.x_length != 0 {
            neighbors.push(square_index - 1);
        }
        if (square_index + 2) % self.x_length != 0 {
            neighbors.push(square_index + 1);
        }
        if square_index >= self.x_length {
            neighbors.push(square_index - self.x_length);
        }
        if square_index < self.x_length * (self.z_length - 2) {
            neighbors.push(square_index + self.x_length);
        }
        neighbors
    }

    /// Walks the outline clockwise starting on the far edge of the first
    /// square. Aligned points are merged on the fly.
    fn squares_to_polygon(&self, squares: &[usize], obstacle_index: usize) -> Option<CSGPolygon> {
        let first_square = *squares.first()?;
        let mut cw_point_indices = vec![first_square, first_square + 1];
        let mut direction = EdgeDirection::Right;

        // each outline edge is visited once
        let max_steps = 4 * squares.len() + 1;
        for _ in 0..max_steps {
            let last_point_index = *cw_point_indices.last()?;
            let (next_point_index, used_direction) =
                self.retrieve_next_point_index(last_point_index, direction, squares)?;

            if next_point_index == cw_point_indices[0] {
                if direction == used_direction {
                    cw_point_indices.pop();
                }
                return Some(self.point_indices_to_polygon(&cw_point_indices, obstacle_index));
            }

            if direction == used_direction {
                let last = cw_point_indices.len() - 1;
                cw_point_indices[last] = next_point_index;
            } else {
                cw_point_indices.push(next_point_index);
                direction = used_direction;
            }
        }

        None
    }

    fn retrieve_next_point_index(
        &self,
        point_index: usize,
        direction: EdgeDirection,
        squares: &[usize],
    ) -> Option<(usize, EdgeDirection)> {
        direction.check_directions().into_iter().find_map(|check_direction| {
            self.next_point_in_direction(point_index, check_direction)
                .filter(|&next| self.edge_belong_to_one_square(point_index, next, squares))
                .map(|next| (next, check_direction))
        })
    }

    fn next_point_in_direction(&self, point_index: usize, direction: EdgeDirection) -> Option<usize> {
        match direction {
            EdgeDirection::Right => {
                ((point_index + 1) % self.x_length != 0).then_some(point_index + 1)
            }
            EdgeDirection::Bottom => (point_index < self.x_length * (self.z_length - 1))
                .then_some(point_index + self.x_length),
            EdgeDirection::Left => (point_index % self.x_length != 0).then(|| point_index - 1),
            EdgeDirection::Top => {
                (point_index >= self.x_length).then(|| point_index - self.x_length)
            }
        }
    }

    fn edge_belong_to_one_square(&self, point1: usize, point2: usize, squares: &[usize]) -> bool {
        squares.iter().any(|&square| {
            let corners = [
                square,
                square + 1,
                square + self.x_length,
                square + self.x_length + 1,
            ];
            corners.contains(&point1) && corners.contains(&point2)
        })
    }

    fn point_indices_to_polygon(&self, cw_point_indices: &[usize], obstacle_index: usize) -> CSGPolygon {
        let cw_points = cw_point_indices
            .iter()
            .map(|&index| {
                let vertex = self.local_vertices[index] + self.position;
                Vec2::new(vertex.x, -vertex.z)
            })
            .collect();

        CSGPolygon::new(
            format!("{}_obstacle{}", self.terrain_name, obstacle_index),
            cw_points,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(heights: &[f32], x_length: usize) -> Vec<Vec3> {
        heights
            .iter()
            .enumerate()
            .map(|(i, &h)| Vec3::new((i % x_length) as f32, h, (i / x_length) as f32))
            .collect()
    }

    fn assert_points(polygon: &CSGPolygon, expected: &[(f32, f32)]) {
        let points = polygon.cw_points();
        assert_eq!(points.len(), expected.len(), "points: {:?}", points);
        for (point, &(x, y)) in points.iter().zip(expected) {
            assert!(
                (*point - Vec2::new(x, y)).length() < 1e-5,
                "points: {:?}",
                points
            );
        }
    }

    #[test]
    fn test_one_square() {
        #[rustfmt::skip]
        let vertices = grid(&[
            0.0, 0.0, 100.0,
            0.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
        ], 3);
        let service = TerrainObstacleService::new("terrain", Vec3::ZERO, &vertices, 3, 3);

        let obstacles = service.compute_self_obstacles(0.01);

        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].name(), "terrain_obstacle0");
        assert_points(&obstacles[0], &[(1.0, 0.0), (2.0, 0.0), (2.0, -1.0), (1.0, -1.0)]);
    }

    #[test]
    fn test_two_aligned_squares() {
        #[rustfmt::skip]
        let vertices = grid(&[
            0.0, 0.0, 100.0,
            0.0, 0.0, 100.0,
            0.0, 0.0, 0.0,
        ], 3);
        let service = TerrainObstacleService::new("terrain", Vec3::ZERO, &vertices, 3, 3);

        let obstacles = service.compute_self_obstacles(0.01);

        assert_eq!(obstacles.len(), 1);
        assert_points(&obstacles[0], &[(1.0, 0.0), (2.0, 0.0), (2.0, -2.0), (1.0, -2.0)]);
    }

    #[test]
    fn test_two_squares_same_point() {
        #[rustfmt::skip]
        let vertices = grid(&[
            0.0, 0.0, 100.0,
            0.0, 0.0, 0.0,
            100.0, 0.0, 0.0,
        ], 3);
        let service = TerrainObstacleService::new("terrain", Vec3::ZERO, &vertices, 3, 3);

        let obstacles = service.compute_self_obstacles(0.01);

        assert_eq!(obstacles.len(), 2);
        assert_eq!(obstacles[0].name(), "terrain_obstacle0");
        assert_points(&obstacles[0], &[(1.0, 0.0), (2.0, 0.0), (2.0, -1.0), (1.0, -1.0)]);
        assert_eq!(obstacles[1].name(), "terrain_obstacle1");
        assert_points(&obstacles[1], &[(0.0, -1.0), (1.0, -1.0), (1.0, -2.0), (0.0, -2.0)]);
    }

    #[test]
    fn test_squares_in_u_form() {
        #[rustfmt::skip]
        let vertices = grid(&[
            0.0, 0.0, 0.0, 0.0,
            100.0, 0.0, 0.0, 100.0,
            100.0, 100.0, 100.0, 100.0,
        ], 4);
        let service = TerrainObstacleService::new("terrain", Vec3::ZERO, &vertices, 4, 3);

        let obstacles = service.compute_self_obstacles(0.01);

        assert_eq!(obstacles.len(), 1);
        assert_points(
            &obstacles[0],
            &[
                (0.0, 0.0),
                (1.0, 0.0),
                (1.0, -1.0),
                (2.0, -1.0),
                (2.0, 0.0),
                (3.0, 0.0),
                (3.0, -2.0),
                (0.0, -2.0),
            ],
        );
    }

    #[test]
    fn test_flat_terrain_without_obstacle() {
        let vertices = grid(&[0.0; 9], 3);
        let service = TerrainObstacleService::new("terrain", Vec3::ZERO, &vertices, 3, 3);
        assert!(service.compute_self_obstacles(0.5).is_empty());
    }

    #[test]
    fn test_position_offset() {
        #[rustfmt::skip]
        let vertices = grid(&[
            0.0, 0.0, 100.0,
            0.0, 0.0, 0.0,
            0.0, 0.0, 0.0,
        ], 3);
        let service =
            TerrainObstacleService::new("terrain", Vec3::new(10.0, 0.0, 5.0), &vertices, 3, 3);

        let obstacles = service.compute_self_obstacles(0.01);
        assert_points(
            &obstacles[0],
            &[(11.0, -5.0), (12.0, -5.0), (12.0, -6.0), (11.0, -6.0)],
        );
    }
}
