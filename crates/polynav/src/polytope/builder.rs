use std::collections::BTreeSet;

use glam::Vec3;
use polynav_common::{Error, Plane, Result};

use super::{
    ObstacleHull, Polytope, PolytopePlaneSurface, PolytopeSurface, PolytopeTerrainSurface,
    TerrainObstacleService,
};
use crate::{AIEntity, AIEntityKind, AIObject, AIShape, AITerrain, NavMeshConfig, Transform};

/// Point indices of the box faces, counter clockwise seen from outside:
/// right, left, top, bottom, front, back
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [3, 2, 6, 7],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

/// A face of a polyhedron before expansion
struct PolyhedronFace {
    ccw_indices: Vec<usize>,
    walkable_candidate: bool,
}

/// Convex volume of a shape placed in the world
struct Polyhedron {
    name: String,
    points: Vec<Vec3>,
    faces: Vec<PolyhedronFace>,
}

impl Polyhedron {
    fn face_normal(&self, face: &PolyhedronFace) -> Vec3 {
        let p0 = self.points[face.ccw_indices[0]];
        let p1 = self.points[face.ccw_indices[1]];
        let p2 = self.points[face.ccw_indices[2]];
        (p1 - p0).cross(p2 - p0).normalize_or_zero()
    }

    /// Faces sharing each point
    fn point_faces(&self) -> Vec<Vec<usize>> {
        let mut point_faces = vec![Vec::new(); self.points.len()];
        for (face_index, face) in self.faces.iter().enumerate() {
            for &point_index in &face.ccw_indices {
                point_faces[point_index].push(face_index);
            }
        }
        point_faces
    }

    fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = BTreeSet::new();
        for face in &self.faces {
            let n = face.ccw_indices.len();
            for i in 0..n {
                let a = face.ccw_indices[i];
                let b = face.ccw_indices[(i + 1) % n];
                edges.insert((a.min(b), a.max(b)));
            }
        }
        edges.into_iter().collect()
    }
}

/// Converts the entities in polytopes expanded by the agent size
pub struct PolytopeBuilder<'a> {
    config: &'a NavMeshConfig,
}

impl<'a> PolytopeBuilder<'a> {
    pub fn new(config: &'a NavMeshConfig) -> Self {
        Self { config }
    }

    /// Builds the polytopes of an entity placed at `transform`.
    ///
    /// An object gives one polytope per shape, named after the entity
    /// (`<entity>[<shape index>]` when it has several shapes).
    pub fn build_polytopes(&self, entity: &AIEntity, transform: &Transform) -> Result<Vec<Polytope>> {
        match entity.kind() {
            AIEntityKind::Object(object) => self.build_object_polytopes(
                entity.name(),
                transform,
                object,
                entity.is_obstacle_candidate(),
            ),
            AIEntityKind::Terrain(terrain) => Ok(vec![self.build_terrain_polytope(
                entity.name(),
                transform,
                terrain,
                entity.is_obstacle_candidate(),
            )?]),
        }
    }

    fn build_object_polytopes(
        &self,
        name: &str,
        transform: &Transform,
        object: &AIObject,
        obstacle_candidate: bool,
    ) -> Result<Vec<Polytope>> {
        let mut polytopes = Vec::with_capacity(object.shapes.len());
        for (shape_index, object_shape) in object.shapes.iter().enumerate() {
            let shape_name = if object.shapes.len() == 1 {
                name.to_string()
            } else {
                format!("{}[{}]", name, shape_index)
            };
            let shape_transform = match &object_shape.local_transform {
                Some(local_transform) => transform.combine(local_transform),
                None => *transform,
            };

            let polyhedron = self.create_polyhedron(shape_name, &object_shape.shape, &shape_transform)?;
            polytopes.push(self.create_expanded_polytope(polyhedron, obstacle_candidate));
        }
        Ok(polytopes)
    }

    fn create_polyhedron(&self, name: String, shape: &AIShape, transform: &Transform) -> Result<Polyhedron> {
        match shape {
            AIShape::Box { half_sizes } => Ok(Self::create_box_polyhedron(
                name,
                *half_sizes,
                transform,
                |_| true,
            )),
            AIShape::Capsule {
                radius,
                cylinder_height,
                axis,
            } => {
                let mut half_sizes = Vec3::splat(*radius);
                half_sizes[axis.index()] += cylinder_height / 2.0;
                Ok(Self::create_box_polyhedron(name, half_sizes, transform, |_| false))
            }
            AIShape::Cone {
                radius,
                height,
                axis,
            } => {
                let mut half_sizes = Vec3::splat(*radius);
                half_sizes[axis.index()] = height / 2.0;
                Ok(Self::create_box_polyhedron(name, half_sizes, transform, |_| false))
            }
            AIShape::Cylinder {
                radius,
                height,
                axis,
            } => {
                let mut half_sizes = Vec3::splat(*radius);
                half_sizes[axis.index()] = height / 2.0;
                let axis_index = axis.index();
                Ok(Self::create_box_polyhedron(
                    name,
                    half_sizes,
                    transform,
                    move |face_index| face_index / 2 == axis_index,
                ))
            }
            AIShape::Sphere { radius } => Ok(Self::create_box_polyhedron(
                name,
                Vec3::splat(*radius),
                transform,
                |_| false,
            )),
            AIShape::ConvexHull { points, triangles } => {
                Self::create_convex_hull_polyhedron(name, points, triangles, transform)
            }
            AIShape::Unsupported { type_name } => Err(Error::Configuration(format!(
                "Shape type not supported by navigation mesh generator: {}",
                type_name
            ))),
        }
    }

    /// Oriented box. `walkable_face` tells which faces (index in
    /// [`BOX_FACES`]) may be walked on.
    fn create_box_polyhedron(
        name: String,
        half_sizes: Vec3,
        transform: &Transform,
        walkable_face: impl Fn(usize) -> bool,
    ) -> Polyhedron {
        let axes = [
            transform.rotate(Vec3::X),
            transform.rotate(Vec3::Y),
            transform.rotate(Vec3::Z),
        ];
        let points = (0..8)
            .map(|i| {
                let sign = |bit: usize| if i & bit != 0 { -1.0 } else { 1.0 };
                transform.position
                    + axes[0] * (sign(4) * half_sizes.x)
                    + axes[1] * (sign(2) * half_sizes.y)
                    + axes[2] * (sign(1) * half_sizes.z)
            })
            .collect();

        let faces = BOX_FACES
            .iter()
            .enumerate()
            .map(|(face_index, indices)| PolyhedronFace {
                ccw_indices: indices.to_vec(),
                walkable_candidate: walkable_face(face_index),
            })
            .collect();

        Polyhedron {
            name,
            points,
            faces,
        }
    }

    fn create_convex_hull_polyhedron(
        name: String,
        local_points: &[Vec3],
        triangles: &[[usize; 3]],
        transform: &Transform,
    ) -> Result<Polyhedron> {
        if local_points.len() < 4 || triangles.len() < 4 {
            return Err(Error::Configuration(format!(
                "Convex hull of {} must have at least 4 points and 4 triangles",
                name
            )));
        }
        if let Some(triangle) = triangles
            .iter()
            .find(|triangle| triangle.iter().any(|&index| index >= local_points.len()))
        {
            return Err(Error::Configuration(format!(
                "Convex hull of {} references an unknown point: {:?}",
                name, triangle
            )));
        }

        let points = local_points
            .iter()
            .map(|point| transform.transform_point(*point))
            .collect();
        let faces = triangles
            .iter()
            .map(|triangle| PolyhedronFace {
                ccw_indices: triangle.to_vec(),
                walkable_candidate: false,
            })
            .collect();

        Ok(Polyhedron {
            name,
            points,
            faces,
        })
    }

    fn is_walkable_slope(&self, normal: Vec3) -> bool {
        normal.dot(Vec3::Y) > self.config.max_slope.cos()
    }

    fn create_expanded_polytope(&self, polyhedron: Polyhedron, obstacle_candidate: bool) -> Polytope {
        let agent = &self.config.agent;
        let normals: Vec<Vec3> = polyhedron
            .faces
            .iter()
            .map(|face| polyhedron.face_normal(face))
            .collect();
        let expanded_planes: Vec<Plane> = polyhedron
            .faces
            .iter()
            .zip(&normals)
            .map(|(face, normal)| {
                Plane::from_normal_and_point(*normal, polyhedron.points[face.ccw_indices[0]])
                    .translated(agent.compute_expand_distance(*normal))
            })
            .collect();

        let expanded_points: Vec<Vec3> = polyhedron
            .point_faces()
            .iter()
            .zip(&polyhedron.points)
            .map(|(faces, point)| self.expand_point(&polyhedron.name, *point, faces, &expanded_planes))
            .collect();

        let mut surfaces = Vec::with_capacity(polyhedron.faces.len());
        for (face_index, (face, normal)) in polyhedron.faces.iter().zip(&normals).enumerate() {
            let surface_name = format!("{}[{}]", polyhedron.name, face_index);
            if face.walkable_candidate && self.is_walkable_slope(*normal) {
                let expand_distance = agent.compute_expand_distance(*normal);
                let walkable_points: Vec<Vec3> = face
                    .ccw_indices
                    .iter()
                    .map(|&index| polyhedron.points[index] + *normal * expand_distance)
                    .collect();
                for (tile_name, tile_points) in self.split_in_tiles(surface_name, walkable_points) {
                    surfaces.push(PolytopeSurface::Plane(PolytopePlaneSurface::with_normal(
                        tile_name,
                        tile_points,
                        *normal,
                        true,
                    )));
                }
            } else {
                let points = face
                    .ccw_indices
                    .iter()
                    .map(|&index| expanded_points[index])
                    .collect();
                surfaces.push(PolytopeSurface::Plane(PolytopePlaneSurface::with_normal(
                    surface_name,
                    points,
                    *normal,
                    false,
                )));
            }
        }

        let hull = ObstacleHull::new(expanded_points, polyhedron.edges());
        Polytope::new(polyhedron.name, surfaces, Some(hull), true, obstacle_candidate)
    }

    fn expand_point(&self, name: &str, point: Vec3, faces: &[usize], planes: &[Plane]) -> Vec3 {
        match faces {
            [] => point,
            [face] => {
                let normal = planes[*face].normal;
                point + normal * self.config.agent.compute_expand_distance(normal)
            }
            _ => match Self::intersect_three_non_parallel_planes(faces, planes) {
                Some(expanded_point) => expanded_point,
                None => {
                    log::error!(
                        "Impossible to find three non parallel planes for point {:?} of {}: useless point",
                        point,
                        name
                    );
                    point
                }
            },
        }
    }

    fn intersect_three_non_parallel_planes(faces: &[usize], planes: &[Plane]) -> Option<Vec3> {
        for (i, &face1) in faces.iter().enumerate() {
            for (j, &face2) in faces.iter().enumerate().skip(i + 1) {
                for &face3 in faces.iter().skip(j + 1) {
                    if let Some(point) =
                        Plane::intersect_three(&planes[face1], &planes[face2], &planes[face3])
                    {
                        return Some(point);
                    }
                }
            }
        }
        None
    }

    /// Splits a walkable rectangle wider than `polytope_max_size` in a grid
    /// of tiles named `<surface>[<tile>]`. Other faces are kept whole.
    fn split_in_tiles(&self, surface_name: String, ccw_points: Vec<Vec3>) -> Vec<(String, Vec<Vec3>)> {
        if ccw_points.len() != 4 {
            return vec![(surface_name, ccw_points)];
        }
        let origin = ccw_points[0];
        let u = ccw_points[1] - origin;
        let v = ccw_points[3] - origin;
        let is_parallelogram = (origin + u + v - ccw_points[2]).length() <= 1e-4 * (u.length() + v.length());

        let max_size = self.config.polytope_max_size;
        let u_tiles = (u.length() / max_size).ceil().max(1.0) as usize;
        let v_tiles = (v.length() / max_size).ceil().max(1.0) as usize;
        if !is_parallelogram || u_tiles * v_tiles == 1 {
            return vec![(surface_name, ccw_points)];
        }

        let corner = |i: usize, j: usize| {
            origin + u * (i as f32 / u_tiles as f32) + v * (j as f32 / v_tiles as f32)
        };
        let mut tiles = Vec::with_capacity(u_tiles * v_tiles);
        for j in 0..v_tiles {
            for i in 0..u_tiles {
                tiles.push((
                    format!("{}[{}]", surface_name, j * u_tiles + i),
                    vec![corner(i, j), corner(i + 1, j), corner(i + 1, j + 1), corner(i, j + 1)],
                ));
            }
        }
        tiles
    }

    fn build_terrain_polytope(
        &self,
        name: &str,
        transform: &Transform,
        terrain: &AITerrain,
        obstacle_candidate: bool,
    ) -> Result<Polytope> {
        if terrain.x_length < 2
            || terrain.z_length < 2
            || terrain.local_vertices.len() != terrain.x_length * terrain.z_length
        {
            return Err(Error::Configuration(format!(
                "Terrain {} must be a grid of at least 2x2 vertices: {} vertices for {}x{}",
                name,
                terrain.local_vertices.len(),
                terrain.x_length,
                terrain.z_length
            )));
        }

        let position = transform.position;
        let self_obstacles = TerrainObstacleService::new(
            name,
            position,
            &terrain.local_vertices,
            terrain.x_length,
            terrain.z_length,
        )
        .compute_self_obstacles(self.config.terrain_max_walkable_slope);

        let expand_height = self.config.agent.compute_expand_distance(Vec3::Y);
        let surface = PolytopeTerrainSurface::new(
            format!("{}[0]", name),
            position,
            terrain.local_vertices.clone(),
            terrain.x_length,
            terrain.z_length,
            expand_height,
            self_obstacles,
        );

        Ok(Polytope::new(
            name,
            vec![PolytopeSurface::Terrain(surface)],
            None,
            true,
            obstacle_candidate,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Axis, NavMeshAgent, ObjectShape};
    use glam::{Quat, Vec2};

    fn config(agent_height: f32, agent_radius: f32) -> NavMeshConfig {
        NavMeshConfig::new(NavMeshAgent::new(agent_height, agent_radius))
    }

    fn object(name: &str, position: Vec3, shapes: Vec<AIShape>) -> AIEntity {
        AIEntity::new_object(
            name,
            Transform::from_position(position),
            true,
            shapes.into_iter().map(ObjectShape::new).collect(),
        )
    }

    fn build(config: &NavMeshConfig, entity: &AIEntity) -> Result<Vec<Polytope>> {
        PolytopeBuilder::new(config).build_polytopes(entity, &entity.transform())
    }

    fn assert_vec3(actual: Vec3, expected: Vec3) {
        assert!((actual - expected).length() < 1e-4, "{:?} != {:?}", actual, expected);
    }

    #[test]
    fn test_box_expansion() {
        let config = config(1.8, 0.5);
        let entity = object(
            "box",
            Vec3::ZERO,
            vec![AIShape::Box {
                half_sizes: Vec3::new(1.0, 0.5, 2.0),
            }],
        );

        let polytopes = build(&config, &entity).unwrap();

        assert_eq!(polytopes.len(), 1);
        let polytope = &polytopes[0];
        assert_eq!(polytope.name(), "box");
        assert_eq!(polytope.surfaces().len(), 6);
        let hull = polytope.obstacle_hull().unwrap();
        assert_eq!(hull.points().len(), 8);
        assert_eq!(hull.edges().len(), 12);
        assert_vec3(hull.points()[0], Vec3::new(1.5, 1.4, 2.5));
        assert_vec3(hull.points()[7], Vec3::new(-1.5, -1.4, -2.5));

        let walkable: Vec<&PolytopeSurface> = polytope.walkable_surfaces().collect();
        assert_eq!(walkable.len(), 1);
        assert_eq!(walkable[0].name(), "box[2]");
        // walkable face is raised but not expanded on the sides
        let (min, max) = walkable[0].xz_bounds();
        assert!((min - Vec2::new(-1.0, -2.0)).length() < 1e-5);
        assert!((max - Vec2::new(1.0, 2.0)).length() < 1e-5);
        let real_point = walkable[0].compute_real_point(Vec2::ZERO, &config.agent);
        assert_vec3(real_point, Vec3::new(0.0, 0.5, 0.0));

        let (min, max) = polytope.xz_bounds();
        assert!((min - Vec2::new(-1.5, -2.5)).length() < 1e-5);
        assert!((max - Vec2::new(1.5, 2.5)).length() < 1e-5);
    }

    #[test]
    fn test_rotated_box_top_face_not_walkable() {
        let config = config(2.0, 0.5);
        let entity = AIEntity::new_object(
            "tilted",
            Transform::new(Vec3::ZERO, Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
            true,
            vec![ObjectShape::new(AIShape::Box {
                half_sizes: Vec3::ONE,
            })],
        );

        let polytopes = build(&config, &entity).unwrap();

        // the right face is now on top
        let walkable: Vec<&PolytopeSurface> = polytopes[0].walkable_surfaces().collect();
        assert_eq!(walkable.len(), 1);
        assert_eq!(walkable[0].name(), "tilted[0]");
    }

    #[test]
    fn test_multiple_shapes_naming() {
        let config = config(2.0, 0.5);
        let entity = AIEntity::new_object(
            "compound",
            Transform::from_position(Vec3::new(10.0, 0.0, 0.0)),
            true,
            vec![
                ObjectShape::new(AIShape::Sphere { radius: 1.0 }),
                ObjectShape::new(AIShape::Box {
                    half_sizes: Vec3::ONE,
                })
                .with_local_transform(Transform::from_position(Vec3::new(0.0, 3.0, 0.0))),
            ],
        );

        let polytopes = build(&config, &entity).unwrap();

        assert_eq!(polytopes.len(), 2);
        assert_eq!(polytopes[0].name(), "compound[0]");
        assert_eq!(polytopes[1].name(), "compound[1]");
        assert_eq!(polytopes[0].walkable_surfaces().count(), 0);
        let top = polytopes[1].walkable_surfaces().next().unwrap();
        let real_point = top.compute_real_point(Vec2::new(10.0, 0.0), &config.agent);
        assert_vec3(real_point, Vec3::new(10.0, 4.0, 0.0));
    }

    #[test]
    fn test_cylinder_walkable_faces() {
        let config = config(2.0, 0.5);
        let vertical = object(
            "vertical",
            Vec3::ZERO,
            vec![AIShape::Cylinder {
                radius: 1.0,
                height: 4.0,
                axis: Axis::Y,
            }],
        );
        let lying = object(
            "lying",
            Vec3::ZERO,
            vec![AIShape::Cylinder {
                radius: 1.0,
                height: 4.0,
                axis: Axis::X,
            }],
        );

        let vertical_polytope = &build(&config, &vertical).unwrap()[0];
        let lying_polytope = &build(&config, &lying).unwrap()[0];

        assert_eq!(vertical_polytope.walkable_surfaces().count(), 1);
        assert_eq!(lying_polytope.walkable_surfaces().count(), 0);
        let hull = vertical_polytope.obstacle_hull().unwrap();
        assert_vec3(hull.points()[0], Vec3::new(1.5, 3.0, 1.5));
    }

    #[test]
    fn test_capsule_half_sizes() {
        let config = config(2.0, 0.0);
        let capsule = object(
            "capsule",
            Vec3::ZERO,
            vec![AIShape::Capsule {
                radius: 0.5,
                cylinder_height: 2.0,
                axis: Axis::Y,
            }],
        );

        let polytope = &build(&config, &capsule).unwrap()[0];

        assert_eq!(polytope.walkable_surfaces().count(), 0);
        assert_vec3(polytope.obstacle_hull().unwrap().points()[0], Vec3::new(0.5, 2.5, 0.5));
    }

    #[test]
    fn test_convex_hull_expansion() {
        let config = config(2.0, 1.0);
        let tetrahedron = object(
            "tetrahedron",
            Vec3::ZERO,
            vec![AIShape::ConvexHull {
                points: vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(0.0, 0.0, -1.0),
                    Vec3::new(0.0, 1.0, 0.0),
                ],
                triangles: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
            }],
        );

        let polytope = &build(&config, &tetrahedron).unwrap()[0];

        assert_eq!(polytope.surfaces().len(), 4);
        assert_eq!(polytope.walkable_surfaces().count(), 0);
        let hull = polytope.obstacle_hull().unwrap();
        assert_eq!(hull.edges().len(), 6);
        // corner at the origin pushed along -x, -y and +z
        assert_vec3(hull.points()[0], Vec3::new(-1.0, -1.0, 1.0));
    }

    #[test]
    fn test_invalid_convex_hull() {
        let config = config(2.0, 0.5);
        let entity = object(
            "flat",
            Vec3::ZERO,
            vec![AIShape::ConvexHull {
                points: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
                triangles: vec![[0, 1, 2]],
            }],
        );
        assert!(matches!(build(&config, &entity), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_unsupported_shape() {
        let config = config(2.0, 0.5);
        let entity = object(
            "mesh",
            Vec3::ZERO,
            vec![AIShape::Unsupported {
                type_name: "HeightfieldMesh".to_string(),
            }],
        );

        match build(&config, &entity) {
            Err(Error::Configuration(message)) => assert_eq!(
                message,
                "Shape type not supported by navigation mesh generator: HeightfieldMesh"
            ),
            other => panic!("unexpected result: {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_large_face_split_in_tiles() {
        let config = config(2.0, 0.0).with_polytope_max_size(4.0);
        let entity = object(
            "ground",
            Vec3::ZERO,
            vec![AIShape::Box {
                half_sizes: Vec3::new(4.0, 0.5, 2.0),
            }],
        );

        let polytope = &build(&config, &entity).unwrap()[0];

        let tiles: Vec<&PolytopeSurface> = polytope.walkable_surfaces().collect();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].name(), "ground[2][0]");
        assert_eq!(tiles[1].name(), "ground[2][1]");
        for tile in &tiles {
            assert!(polynav_common::signed_area_2d(tile.outline_cw_points()) < 0.0);
            let (min, max) = tile.xz_bounds();
            assert!((max.x - min.x - 4.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_terrain_polytope() {
        let config = config(2.0, 0.5);
        let vertices: Vec<Vec3> = (0..9)
            .map(|i| Vec3::new((i % 3) as f32, 0.0, (i / 3) as f32))
            .collect();
        let entity = AIEntity::new_terrain(
            "terrain",
            Transform::from_position(Vec3::new(-1.0, 0.0, -1.0)),
            true,
            AITerrain::new(vertices, 3, 3),
        );

        let polytopes = build(&config, &entity).unwrap();

        assert_eq!(polytopes.len(), 1);
        assert!(!polytopes[0].is_obstacle_candidate());
        let surface = polytopes[0].walkable_surfaces().next().unwrap();
        assert_eq!(surface.name(), "terrain[0]");
        assert!(surface.self_obstacles().is_empty());
        assert_eq!(surface.outline_cw_points().len(), 4);
    }

    #[test]
    fn test_invalid_terrain() {
        let config = config(2.0, 0.5);
        let entity = AIEntity::new_terrain(
            "line",
            Transform::default(),
            false,
            AITerrain {
                local_vertices: vec![Vec3::ZERO, Vec3::X],
                x_length: 2,
                z_length: 1,
            },
        );
        assert!(matches!(build(&config, &entity), Err(Error::Configuration(_))));
    }
}
