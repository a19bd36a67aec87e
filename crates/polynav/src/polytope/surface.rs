use glam::{Vec2, Vec3};
use polynav_common::{bounds_2d, to_top_view, Plane};

use super::PolytopeTerrainSurface;
use crate::{CSGPolygon, NavMeshAgent};

/// Flat face of a polytope
#[derive(Debug, Clone, PartialEq)]
pub struct PolytopePlaneSurface {
    name: String,
    ccw_points: Vec<Vec3>,
    normal: Vec3,
    walkable: bool,
    outline_cw_points: Vec<Vec2>,
}

impl PolytopePlaneSurface {
    /// `ccw_points` must be coplanar and counter clockwise seen from the
    /// outside of the polytope
    pub fn new(name: impl Into<String>, ccw_points: Vec<Vec3>, walkable: bool) -> Self {
        debug_assert!(ccw_points.len() >= 3);
        let normal = (ccw_points[1] - ccw_points[0])
            .cross(ccw_points[2] - ccw_points[0])
            .normalize_or_zero();
        Self::with_normal(name, ccw_points, normal, walkable)
    }

    pub fn with_normal(
        name: impl Into<String>,
        ccw_points: Vec<Vec3>,
        normal: Vec3,
        walkable: bool,
    ) -> Self {
        let outline_cw_points = ccw_points.iter().rev().map(|p| to_top_view(*p)).collect();
        Self {
            name: name.into(),
            ccw_points,
            normal,
            walkable,
            outline_cw_points,
        }
    }

    pub fn ccw_points(&self) -> &[Vec3] {
        &self.ccw_points
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn plane(&self) -> Plane {
        Plane::from_normal_and_point(self.normal, self.ccw_points[0])
    }

    /// Point of the face before expansion, below `point` (a top view point
    /// of the expanded face)
    pub fn compute_real_point(&self, point: Vec2, agent: &NavMeshAgent) -> Vec3 {
        let mut point_on_surface = Vec3::new(point.x, 0.0, -point.y);
        if self.normal.y != 0.0 {
            let shortest_face_distance = self.normal.dot(self.ccw_points[0] - point_on_surface);
            point_on_surface.y += shortest_face_distance / self.normal.y;
        }

        let reduce_distance = -agent.compute_expand_distance(self.normal);
        point_on_surface + self.normal * reduce_distance
    }
}

/// Surface of a polytope: a plane face or a whole terrain
#[derive(Debug, Clone, PartialEq)]
pub enum PolytopeSurface {
    Plane(PolytopePlaneSurface),
    Terrain(PolytopeTerrainSurface),
}

impl PolytopeSurface {
    pub fn name(&self) -> &str {
        match self {
            PolytopeSurface::Plane(plane) => &plane.name,
            PolytopeSurface::Terrain(terrain) => terrain.name(),
        }
    }

    pub fn is_walkable(&self) -> bool {
        match self {
            PolytopeSurface::Plane(plane) => plane.walkable,
            PolytopeSurface::Terrain(_) => true,
        }
    }

    pub fn outline_cw_points(&self) -> &[Vec2] {
        match self {
            PolytopeSurface::Plane(plane) => &plane.outline_cw_points,
            PolytopeSurface::Terrain(terrain) => terrain.outline_cw_points(),
        }
    }

    /// Obstacles belonging to the surface itself (steep terrain squares)
    pub fn self_obstacles(&self) -> &[CSGPolygon] {
        match self {
            PolytopeSurface::Plane(_) => &[],
            PolytopeSurface::Terrain(terrain) => terrain.self_obstacles(),
        }
    }

    /// Plane on which obstacles inside `obstacle_bounds` (top view) are
    /// projected. `None` when the obstacle is not above the surface.
    pub fn footprint_plane(&self, obstacle_bounds: (Vec2, Vec2)) -> Option<Plane> {
        match self {
            PolytopeSurface::Plane(plane) => Some(plane.plane()),
            PolytopeSurface::Terrain(terrain) => terrain.footprint_plane(obstacle_bounds),
        }
    }

    pub fn compute_real_point(&self, point: Vec2, agent: &NavMeshAgent) -> Vec3 {
        match self {
            PolytopeSurface::Plane(plane) => plane.compute_real_point(point, agent),
            PolytopeSurface::Terrain(terrain) => terrain.compute_real_point(point),
        }
    }

    /// Top view bounding rectangle
    pub fn xz_bounds(&self) -> (Vec2, Vec2) {
        match self {
            PolytopeSurface::Plane(plane) => {
                bounds_2d(&plane.outline_cw_points).unwrap_or((Vec2::ZERO, Vec2::ZERO))
            }
            PolytopeSurface::Terrain(terrain) => terrain.xz_bounds(),
        }
    }
}
