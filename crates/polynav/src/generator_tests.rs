//! Generation scenarios: walkable boxes with obstacles placed on them

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use glam::{Quat, Vec3};
    use polynav_common::Error;

    use crate::{
        AIEntity, AIShape, AIWorld, NavLinkType, NavMesh, NavMeshAgent, NavMeshConfig, NavMeshGenerator,
        ObjectShape, Transform,
    };

    fn generator() -> NavMeshGenerator {
        let config = NavMeshConfig::new(NavMeshAgent::new(2.0, 0.0));
        NavMeshGenerator::new(config).unwrap()
    }

    fn flat_box(name: &str, position: Vec3, half_sizes: Vec3) -> Arc<AIEntity> {
        Arc::new(AIEntity::new_object(
            name,
            Transform::from_position(position),
            true,
            vec![ObjectShape::new(AIShape::Box { half_sizes })],
        ))
    }

    fn walkable_face(name: &str, position: Vec3) -> Arc<AIEntity> {
        flat_box(name, position, Vec3::new(2.0, 0.01, 2.0))
    }

    fn hole(position: Vec3) -> Arc<AIEntity> {
        flat_box("hole", position, Vec3::new(1.0, 0.01, 1.0))
    }

    fn polygon_names(nav_mesh: &NavMesh) -> BTreeSet<String> {
        nav_mesh.polygons().iter().map(|p| p.name().to_string()).collect()
    }

    fn contains_point(points: &[Vec3], expected: Vec3) -> bool {
        points.iter().any(|point| point.distance(expected) < 0.001)
    }

    fn has_link_to(nav_mesh: &NavMesh, source: usize, target: usize, link_type: NavLinkType) -> bool {
        nav_mesh.polygons()[source].triangles().iter().any(|triangle| {
            triangle
                .links()
                .iter()
                .any(|link| link.link_type() == link_type && link.target().polygon_index == target)
        })
    }

    #[test]
    fn test_hole_on_walkable_face() {
        let mut world = AIWorld::new();
        world.add_entity(walkable_face("walkableFace", Vec3::ZERO));
        world.add_entity(hole(Vec3::new(0.0, 1.0, 0.0)));

        let nav_mesh = generator().generate(&mut world).unwrap();

        assert_eq!(nav_mesh.polygons().len(), 2);
        let hole_polygon = &nav_mesh.polygons()[0];
        assert_eq!(hole_polygon.name(), "<hole[2]>");
        assert_eq!(hole_polygon.points().len(), 4);
        assert_eq!(hole_polygon.triangles().len(), 2);

        let face_polygon = &nav_mesh.polygons()[1];
        assert_eq!(face_polygon.name(), "<walkableFace[2]> - <hole>");
        assert_eq!(face_polygon.points().len(), 8);
        assert_eq!(face_polygon.triangles().len(), 8);
        assert!(face_polygon.points().iter().all(|point| (point.y - 0.01).abs() < 0.001));
    }

    #[test]
    fn test_hole_overlapping_walkable_face_border() {
        let mut world = AIWorld::new();
        world.add_entity(walkable_face("walkableFace", Vec3::ZERO));
        world.add_entity(hole(Vec3::new(-2.0, 1.0, -2.0)));

        let nav_mesh = generator().generate(&mut world).unwrap();

        assert_eq!(nav_mesh.polygons().len(), 2);
        assert_eq!(nav_mesh.polygons()[0].name(), "<hole[2]>");

        let face_polygon = &nav_mesh.polygons()[1];
        assert_eq!(face_polygon.name(), "<[walkableFace[2]] - [hole]>");
        assert_eq!(face_polygon.points().len(), 6);
        assert_eq!(face_polygon.triangles().len(), 4);
        assert!(contains_point(face_polygon.points(), Vec3::new(2.0, 0.01, 2.0)));
        assert!(contains_point(face_polygon.points(), Vec3::new(2.0, 0.01, -2.0)));
    }

    #[test]
    fn test_move_hole_to_another_face() {
        let mut world = AIWorld::new();
        world.add_entity(walkable_face("leftFace", Vec3::ZERO));
        world.add_entity(walkable_face("rightFace", Vec3::new(5.0, 0.0, 0.0)));
        let moving_hole = hole(Vec3::new(0.0, 1.0, 0.0));
        world.add_entity(Arc::clone(&moving_hole));
        let mut generator = generator();

        let nav_mesh = generator.generate(&mut world).unwrap();
        let expected: BTreeSet<String> = ["<hole[2]>", "<leftFace[2]> - <hole>", "<rightFace[2]>"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(polygon_names(&nav_mesh), expected);

        moving_hole.update_transform(Vec3::new(5.0, 1.0, 0.0), Quat::IDENTITY);
        let moved_nav_mesh = generator.generate(&mut world).unwrap();
        let expected: BTreeSet<String> = ["<hole[2]>", "<leftFace[2]>", "<rightFace[2]> - <hole>"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(polygon_names(&moved_nav_mesh), expected);
        assert!(moved_nav_mesh.update_id() > nav_mesh.update_id());
    }

    #[test]
    fn test_remove_hole() {
        let mut world = AIWorld::new();
        world.add_entity(walkable_face("walkableFace", Vec3::ZERO));
        let hole = hole(Vec3::new(0.0, 1.0, 0.0));
        world.add_entity(Arc::clone(&hole));
        let mut generator = generator();
        assert_eq!(generator.generate(&mut world).unwrap().polygons().len(), 2);

        assert!(world.remove_entity(&hole));
        let nav_mesh = generator.generate(&mut world).unwrap();

        assert_eq!(nav_mesh.polygons().len(), 1);
        assert_eq!(nav_mesh.polygons()[0].name(), "<walkableFace[2]>");
        assert_eq!(nav_mesh.polygons()[0].triangles().len(), 2);
    }

    #[test]
    fn test_unchanged_world_keeps_nav_mesh() {
        let mut world = AIWorld::new();
        world.add_entity(walkable_face("walkableFace", Vec3::ZERO));
        let mut generator = generator();

        let first = generator.generate(&mut world).unwrap();
        let second = generator.generate(&mut world).unwrap();

        assert_eq!(first.update_id(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &generator.shared_nav_mesh().load()));
    }

    #[test]
    fn test_unsupported_shape_publishes_nothing() {
        let mut world = AIWorld::new();
        world.add_entity(walkable_face("walkableFace", Vec3::ZERO));
        let unsupported = Arc::new(AIEntity::new_object(
            "mesh",
            Transform::default(),
            true,
            vec![ObjectShape::new(AIShape::Unsupported {
                type_name: "TriangleMesh".to_string(),
            })],
        ));
        world.add_entity(Arc::clone(&unsupported));
        let mut generator = generator();

        let result = generator.generate(&mut world);

        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(generator.current_nav_mesh().update_id(), 0);
        assert!(world.entities().iter().all(|entity| entity.is_to_rebuild()));

        assert!(world.remove_entity(&unsupported));
        let nav_mesh = generator.generate(&mut world).unwrap();
        assert_eq!(nav_mesh.update_id(), 1);
        assert_eq!(nav_mesh.polygons().len(), 1);
    }

    #[test]
    fn test_set_config() {
        let mut generator = generator();
        let invalid = NavMeshConfig::new(NavMeshAgent::new(-1.0, 0.0));
        assert!(matches!(generator.set_config(invalid), Err(Error::Configuration(_))));

        let mut world = AIWorld::new();
        world.add_entity(walkable_face("walkableFace", Vec3::ZERO));
        let first = generator.generate(&mut world).unwrap();

        let config = NavMeshConfig::new(NavMeshAgent::new(2.0, 0.5));
        generator.set_config(config).unwrap();
        let second = generator.generate(&mut world).unwrap();

        assert_eq!(second.update_id(), first.update_id() + 1);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.polygons().len(), 1);
    }

    #[test]
    fn test_jump_between_close_faces() {
        let mut world = AIWorld::new();
        world.add_entity(walkable_face("leftFace", Vec3::ZERO));
        world.add_entity(walkable_face("rightFace", Vec3::new(5.0, 0.0, 0.0)));

        let nav_mesh = generator().generate(&mut world).unwrap();

        assert_eq!(nav_mesh.polygons().len(), 2);
        assert!(has_link_to(&nav_mesh, 0, 1, NavLinkType::Jump));
        assert!(has_link_to(&nav_mesh, 1, 0, NavLinkType::Jump));
        assert!(!has_link_to(&nav_mesh, 0, 1, NavLinkType::JoinPolygons));
    }

    #[test]
    fn test_join_tiles_of_large_face() {
        let mut world = AIWorld::new();
        world.add_entity(flat_box("ground", Vec3::ZERO, Vec3::new(30.0, 0.01, 2.0)));

        let nav_mesh = generator().generate(&mut world).unwrap();

        let expected: BTreeSet<String> = ["<ground[2][0]>", "<ground[2][1]>"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(polygon_names(&nav_mesh), expected);
        assert!(has_link_to(&nav_mesh, 0, 1, NavLinkType::JoinPolygons));
        assert!(has_link_to(&nav_mesh, 1, 0, NavLinkType::JoinPolygons));
    }
}
