use glam::{Vec2, Vec3};
use polynav_common::{overlap_bounds_2d, to_top_view, Plane};

use crate::CSGPolygon;

/// Walkable surface of a heightfield terrain. The walkable outline is the
/// rectangle covered by the grid; steep squares are excluded through the
/// self obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct PolytopeTerrainSurface {
    name: String,
    position: Vec3,
    local_vertices: Vec<Vec3>,
    x_length: usize,
    z_length: usize,
    expand_height: f32,
    outline_cw_points: Vec<Vec2>,
    self_obstacles: Vec<CSGPolygon>,
}

impl PolytopeTerrainSurface {
    /// `local_vertices` follow the layout of [`crate::AITerrain`] and must
    /// contain at least two rows of two vertices
    pub fn new(
        name: impl Into<String>,
        position: Vec3,
        local_vertices: Vec<Vec3>,
        x_length: usize,
        z_length: usize,
        expand_height: f32,
        self_obstacles: Vec<CSGPolygon>,
    ) -> Self {
        debug_assert!(x_length >= 2 && z_length >= 2);
        debug_assert_eq!(local_vertices.len(), x_length * z_length);

        let last = local_vertices.len() - 1;
        let outline_cw_points = [
            local_vertices[0],
            local_vertices[x_length - 1],
            local_vertices[last],
            local_vertices[last + 1 - x_length],
        ]
        .iter()
        .map(|p| to_top_view(*p + position))
        .collect();

        Self {
            name: name.into(),
            position,
            local_vertices,
            x_length,
            z_length,
            expand_height,
            outline_cw_points,
            self_obstacles,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outline_cw_points(&self) -> &[Vec2] {
        &self.outline_cw_points
    }

    pub fn self_obstacles(&self) -> &[CSGPolygon] {
        &self.self_obstacles
    }

    pub fn xz_bounds(&self) -> (Vec2, Vec2) {
        self.local_vertices.iter().fold(
            (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
            |(min, max), vertex| {
                let point = to_top_view(*vertex + self.position);
                (min.min(point), max.max(point))
            },
        )
    }

    fn x_interval(&self) -> f32 {
        self.local_vertices[1].x - self.local_vertices[0].x
    }

    fn z_interval(&self) -> f32 {
        self.local_vertices[self.x_length].z - self.local_vertices[0].z
    }

    /// Fractional grid coordinates of a world position, clamped to the grid
    fn grid_coordinates(&self, x: f32, z: f32) -> (f32, f32) {
        let origin = self.local_vertices[0] + self.position;
        let column = ((x - origin.x) / self.x_interval()).clamp(0.0, (self.x_length - 1) as f32);
        let row = ((z - origin.z) / self.z_interval()).clamp(0.0, (self.z_length - 1) as f32);
        (column, row)
    }

    fn vertex_height(&self, column: usize, row: usize) -> f32 {
        self.local_vertices[row * self.x_length + column].y + self.position.y
    }

    /// Terrain point below a top view point, interpolated on the grid
    /// triangles
    pub fn compute_real_point(&self, point: Vec2) -> Vec3 {
        let x = point.x;
        let z = -point.y;
        let (column, row) = self.grid_coordinates(x, z);

        let far_left_column = (column.floor() as usize).min(self.x_length - 2);
        let far_left_row = (row.floor() as usize).min(self.z_length - 2);
        let tx = column - far_left_column as f32;
        let tz = row - far_left_row as f32;

        let far_left = self.vertex_height(far_left_column, far_left_row);
        let far_right = self.vertex_height(far_left_column + 1, far_left_row);
        let near_left = self.vertex_height(far_left_column, far_left_row + 1);
        let near_right = self.vertex_height(far_left_column + 1, far_left_row + 1);

        let height = if tz >= tx {
            // triangle far left, near left, near right
            far_left + tz * (near_left - far_left) + tx * (near_right - near_left)
        } else {
            // triangle far left, near right, far right
            far_left + tx * (far_right - far_left) + tz * (near_right - far_right)
        };

        Vec3::new(x, height, z)
    }

    /// Horizontal plane at the highest expanded terrain point below the
    /// obstacle bounds
    pub fn footprint_plane(&self, obstacle_bounds: (Vec2, Vec2)) -> Option<Plane> {
        let (min, max) = obstacle_bounds;
        let (terrain_min, terrain_max) = self.xz_bounds();
        if !overlap_bounds_2d(min, max, terrain_min, terrain_max) {
            return None;
        }

        let (min_column, min_row) = self.grid_coordinates(min.x, -max.y);
        let (max_column, max_row) = self.grid_coordinates(max.x, -min.y);
        let mut max_height = f32::MIN;
        for row in (min_row.floor() as usize)..=(max_row.ceil() as usize) {
            for column in (min_column.floor() as usize)..=(max_column.ceil() as usize) {
                max_height = max_height.max(self.vertex_height(column, row));
            }
        }

        Some(Plane::from_normal_and_point(
            Vec3::Y,
            Vec3::new(0.0, max_height + self.expand_height, 0.0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x3 grid of 1 unit squares, center vertex raised
    fn hill() -> PolytopeTerrainSurface {
        let mut vertices: Vec<Vec3> = (0..9)
            .map(|i| Vec3::new((i % 3) as f32, 0.0, (i / 3) as f32))
            .collect();
        vertices[4].y = 1.0;
        PolytopeTerrainSurface::new(
            "terrain[0]",
            Vec3::new(-1.0, 0.0, -1.0),
            vertices,
            3,
            3,
            1.0,
            Vec::new(),
        )
    }

    #[test]
    fn test_outline_is_clockwise() {
        let terrain = hill();
        let outline = terrain.outline_cw_points();
        assert_eq!(outline[0], Vec2::new(-1.0, 1.0));
        assert_eq!(outline[1], Vec2::new(1.0, 1.0));
        assert_eq!(outline[2], Vec2::new(1.0, -1.0));
        assert_eq!(outline[3], Vec2::new(-1.0, -1.0));
        assert!(polynav_common::signed_area_2d(outline) < 0.0);
    }

    #[test]
    fn test_compute_real_point_interpolation() {
        let terrain = hill();
        let top = terrain.compute_real_point(Vec2::new(0.0, 0.0));
        assert!((top - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);

        let half = terrain.compute_real_point(Vec2::new(-0.5, 0.5));
        assert!((half.y - 0.5).abs() < 1e-6);

        let border = terrain.compute_real_point(Vec2::new(1.0, -1.0));
        assert!(border.y.abs() < 1e-6);
    }

    #[test]
    fn test_footprint_plane() {
        let terrain = hill();
        let plane = terrain
            .footprint_plane((Vec2::new(-0.2, -0.2), Vec2::new(0.2, 0.2)))
            .unwrap();
        assert!((plane.distance(Vec3::new(0.0, 2.0, 0.0))).abs() < 1e-6);

        assert!(terrain
            .footprint_plane((Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0)))
            .is_none());
    }
}
