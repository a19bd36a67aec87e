use std::fmt;

use glam::{Vec2, Vec3};
use polynav_common::{convex_hull_2d, to_top_view, Plane};

use super::PolytopeSurface;
use crate::CSGPolygon;

/// Points closer than this to a plane are considered on the plane when
/// checking whether a hull crosses it
const FOOTPRINT_PLANE_EPSILON: f32 = 0.0001;

/// Expanded convex volume of an obstacle: points and edges
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleHull {
    points: Vec<Vec3>,
    edges: Vec<(usize, usize)>,
}

impl ObstacleHull {
    pub fn new(points: Vec<Vec3>, edges: Vec<(usize, usize)>) -> Self {
        Self { points, edges }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

/// Convex volume expanded by the agent size, or a terrain.
///
/// Walkable surfaces carry the area where the agent center can stand. The
/// obstacle hull is the volume forbidden to the agent center.
#[derive(Debug, Clone, PartialEq)]
pub struct Polytope {
    name: String,
    surfaces: Vec<PolytopeSurface>,
    obstacle_hull: Option<ObstacleHull>,
    walkable_candidate: bool,
    obstacle_candidate: bool,
    xz_bounds: (Vec2, Vec2),
}

impl Polytope {
    pub fn new(
        name: impl Into<String>,
        surfaces: Vec<PolytopeSurface>,
        obstacle_hull: Option<ObstacleHull>,
        walkable_candidate: bool,
        obstacle_candidate: bool,
    ) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for surface in &surfaces {
            let (surface_min, surface_max) = surface.xz_bounds();
            min = min.min(surface_min);
            max = max.max(surface_max);
        }
        if let Some(hull) = &obstacle_hull {
            for point in hull.points() {
                let point = to_top_view(*point);
                min = min.min(point);
                max = max.max(point);
            }
        }

        Self {
            name: name.into(),
            surfaces,
            obstacle_hull,
            walkable_candidate,
            obstacle_candidate,
            xz_bounds: (min, max),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surfaces(&self) -> &[PolytopeSurface] {
        &self.surfaces
    }

    pub fn walkable_surfaces(&self) -> impl Iterator<Item = &PolytopeSurface> {
        self.surfaces
            .iter()
            .filter(move |surface| self.walkable_candidate && surface.is_walkable())
    }

    pub fn obstacle_hull(&self) -> Option<&ObstacleHull> {
        self.obstacle_hull.as_ref()
    }

    pub fn is_walkable_candidate(&self) -> bool {
        self.walkable_candidate
    }

    pub fn is_obstacle_candidate(&self) -> bool {
        self.obstacle_candidate && self.obstacle_hull.is_some()
    }

    /// Top view bounding rectangle of the expanded polytope
    pub fn xz_bounds(&self) -> (Vec2, Vec2) {
        self.xz_bounds
    }

    /// Section of the obstacle hull by `plane` seen from the top, clockwise.
    ///
    /// `None` when the hull does not cross the plane: an obstacle lying fully
    /// above or below a walkable surface does not block it.
    pub fn compute_footprint(&self, plane: &Plane) -> Option<CSGPolygon> {
        let hull = self.obstacle_hull.as_ref()?;

        let (min_distance, max_distance) = hull.points.iter().fold(
            (f32::MAX, f32::MIN),
            |(min, max), point| {
                let distance = plane.distance(*point);
                (min.min(distance), max.max(distance))
            },
        );
        if min_distance >= -FOOTPRINT_PLANE_EPSILON || max_distance <= FOOTPRINT_PLANE_EPSILON {
            return None;
        }

        let intersections: Vec<Vec2> = hull
            .edges
            .iter()
            .filter_map(|&(a, b)| plane.intersect_segment(hull.points[a], hull.points[b]))
            .map(to_top_view)
            .collect();

        let mut footprint = convex_hull_2d(&intersections);
        if footprint.len() < 3 {
            return None;
        }
        footprint.reverse();
        Some(CSGPolygon::new(self.name.clone(), footprint))
    }
}

impl fmt::Display for Polytope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Polytope {}:", self.name)?;
        for surface in &self.surfaces {
            writeln!(
                f,
                " - {} (walkable: {}): {:?}",
                surface.name(),
                surface.is_walkable(),
                surface.outline_cw_points()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polytope::PolytopePlaneSurface;

    /// Axis aligned cube hull between `min` and `max`
    fn cube_polytope(min: Vec3, max: Vec3) -> Polytope {
        let points: Vec<Vec3> = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 4 != 0 { min.x } else { max.x },
                    if i & 2 != 0 { min.y } else { max.y },
                    if i & 1 != 0 { min.z } else { max.z },
                )
            })
            .collect();
        #[rustfmt::skip]
        let edges = vec![
            (0, 1), (1, 3), (3, 2), (2, 0),
            (4, 5), (5, 7), (7, 6), (6, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];
        let top = PolytopePlaneSurface::new(
            "cube[2]",
            vec![points[0], points[1], points[5], points[4]],
            true,
        );
        Polytope::new(
            "cube",
            vec![PolytopeSurface::Plane(top)],
            Some(ObstacleHull::new(points, edges)),
            true,
            true,
        )
    }

    #[test]
    fn test_footprint_crossing_plane() {
        let cube = cube_polytope(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 1.0, 0.0));

        let footprint = cube.compute_footprint(&plane).unwrap();
        assert_eq!(footprint.name(), "cube");
        assert_eq!(footprint.len(), 4);
        assert!(footprint.is_cw_points());
        assert!((footprint.compute_area() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_no_footprint_when_touching_plane() {
        let cube = cube_polytope(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
        assert!(cube.compute_footprint(&plane).is_none());

        let below = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, -3.0, 0.0));
        assert!(cube.compute_footprint(&below).is_none());
    }

    #[test]
    fn test_bounds() {
        let cube = cube_polytope(Vec3::new(-1.0, 0.0, -3.0), Vec3::new(1.0, 2.0, 1.0));
        let (min, max) = cube.xz_bounds();
        assert_eq!(min, Vec2::new(-1.0, -1.0));
        assert_eq!(max, Vec2::new(1.0, 3.0));
        assert_eq!(cube.walkable_surfaces().count(), 1);
    }
}
