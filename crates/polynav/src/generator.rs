//! Navigation mesh generation from the entities of an [`AIWorld`]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use glam::Vec2;
use polynav_common::{bounds_2d, overlap_bounds_2d, to_top_view, Error, Result};

use crate::{
    subtract_polygons, union_polygons, AIWorld, CSGPolygon, EdgeLinkDetection, EdgeLinkResult,
    NavLinkConstraint, NavMesh, NavMeshConfig, NavPolygon, NavTriangleRef, Polytope,
    PolytopeBuilder, PolytopeSurface, TriangulationAlgorithm,
};

/// Last published navigation mesh, shared between the generator and its
/// readers. Readers only hold the lock while cloning the `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SharedNavMesh {
    nav_mesh: Arc<Mutex<Arc<NavMesh>>>,
}

impl SharedNavMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> Arc<NavMesh> {
        Arc::clone(
            &self
                .nav_mesh
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    fn store(&self, nav_mesh: Arc<NavMesh>) {
        *self
            .nav_mesh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = nav_mesh;
    }
}

/// Polygons computed for a walkable surface, kept until the surface or an
/// obstacle around it changes
#[derive(Debug, Clone)]
struct WalkableSurfaceCache {
    polygons: Vec<NavPolygon>,
}

/// Builds navigation meshes incrementally: only the polytopes of the
/// entities flagged to rebuild are recomputed, and only the walkable
/// surfaces touched by a changed polytope are triangulated again.
#[derive(Debug)]
pub struct NavMeshGenerator {
    config: NavMeshConfig,
    full_refresh: bool,
    polytopes: BTreeMap<String, Vec<Polytope>>,
    walkable_surfaces: BTreeMap<String, WalkableSurfaceCache>,
    nav_mesh: SharedNavMesh,
    update_id: u64,
}

impl NavMeshGenerator {
    pub fn new(config: NavMeshConfig) -> Result<Self> {
        config.validate().map_err(Error::Configuration)?;
        Ok(Self {
            config,
            full_refresh: true,
            polytopes: BTreeMap::new(),
            walkable_surfaces: BTreeMap::new(),
            nav_mesh: SharedNavMesh::new(),
            update_id: 0,
        })
    }

    pub fn config(&self) -> &NavMeshConfig {
        &self.config
    }

    /// Replaces the configuration. The next generation rebuilds everything.
    pub fn set_config(&mut self, config: NavMeshConfig) -> Result<()> {
        config.validate().map_err(Error::Configuration)?;
        self.config = config;
        self.full_refresh = true;
        Ok(())
    }

    /// Handle on the published navigation mesh
    pub fn shared_nav_mesh(&self) -> SharedNavMesh {
        self.nav_mesh.clone()
    }

    pub fn current_nav_mesh(&self) -> Arc<NavMesh> {
        self.nav_mesh.load()
    }

    /// Updates the polytopes of the changed entities and publishes a new
    /// navigation mesh. When nothing changed, the current mesh is returned.
    ///
    /// A shape the builder cannot handle fails the whole call: nothing is
    /// published and the entities stay flagged to rebuild.
    pub fn generate(&mut self, world: &mut AIWorld) -> Result<Arc<NavMesh>> {
        let rebuilt_entities = self.build_changed_polytopes(world)?;
        let removed_entities = world.take_entities_to_remove();

        if !self.full_refresh && rebuilt_entities.is_empty() && removed_entities.is_empty() {
            return Ok(self.current_nav_mesh());
        }

        let mut changed_polytopes = BTreeSet::new();
        let mut dirty_areas = Vec::new();
        for entity in &removed_entities {
            if let Some(old_polytopes) = self.polytopes.remove(entity.name()) {
                for polytope in &old_polytopes {
                    changed_polytopes.insert(polytope.name().to_string());
                    dirty_areas.push(polytope.xz_bounds());
                }
            }
        }
        for (entity_name, new_polytopes) in rebuilt_entities {
            for polytope in &new_polytopes {
                changed_polytopes.insert(polytope.name().to_string());
                dirty_areas.push(polytope.xz_bounds());
            }
            if let Some(old_polytopes) = self.polytopes.insert(entity_name, new_polytopes) {
                for polytope in &old_polytopes {
                    changed_polytopes.insert(polytope.name().to_string());
                    dirty_areas.push(polytope.xz_bounds());
                }
            }
        }

        self.update_walkable_surfaces(&changed_polytopes, &dirty_areas);
        self.full_refresh = false;

        let nav_mesh = Arc::new(self.assemble_nav_mesh());
        log::debug!(
            "Navigation mesh {} generated: {} polygons, {} triangles",
            nav_mesh.update_id(),
            nav_mesh.polygons().len(),
            nav_mesh.triangle_count()
        );
        self.nav_mesh.store(Arc::clone(&nav_mesh));
        Ok(nav_mesh)
    }

    /// Builds the polytopes of the entities flagged to rebuild (all of them
    /// on a full refresh). Nothing is kept when one entity fails.
    fn build_changed_polytopes(&self, world: &AIWorld) -> Result<Vec<(String, Vec<Polytope>)>> {
        let builder = PolytopeBuilder::new(&self.config);
        let mut rebuilt_entities = Vec::new();
        let mut marked_entities = Vec::new();

        for entity in world.entities() {
            if !self.full_refresh && !entity.is_to_rebuild() {
                continue;
            }

            // the flag is cleared before copying the transform so that a
            // concurrent update is picked up by the next generation
            entity.mark_rebuilt();
            marked_entities.push(entity);
            let transform = entity.transform();
            match builder.build_polytopes(entity, &transform) {
                Ok(polytopes) => rebuilt_entities.push((entity.name().to_string(), polytopes)),
                Err(error) => {
                    for marked_entity in marked_entities {
                        marked_entity.mark_to_rebuild();
                    }
                    return Err(error);
                }
            }
        }

        Ok(rebuilt_entities)
    }

    fn update_walkable_surfaces(
        &mut self,
        changed_polytopes: &BTreeSet<String>,
        dirty_areas: &[(Vec2, Vec2)],
    ) {
        if self.full_refresh {
            self.walkable_surfaces.clear();
        }

        let all_polytopes: Vec<&Polytope> = self.polytopes.values().flatten().collect();
        let mut existing_surfaces = BTreeSet::new();

        for polytope in &all_polytopes {
            for surface in polytope.walkable_surfaces() {
                existing_surfaces.insert(surface.name().to_string());

                let (surface_min, surface_max) = surface.xz_bounds();
                let to_compute = !self.walkable_surfaces.contains_key(surface.name())
                    || changed_polytopes.contains(polytope.name())
                    || dirty_areas
                        .iter()
                        .any(|(min, max)| overlap_bounds_2d(*min, *max, surface_min, surface_max));
                if to_compute {
                    let polygons =
                        compute_walkable_polygons(&self.config, polytope, surface, &all_polytopes);
                    self.walkable_surfaces
                        .insert(surface.name().to_string(), WalkableSurfaceCache { polygons });
                }
            }
        }

        self.walkable_surfaces
            .retain(|surface_name, _| existing_surfaces.contains(surface_name));
    }

    fn assemble_nav_mesh(&mut self) -> NavMesh {
        let mut polygons: Vec<NavPolygon> = self
            .walkable_surfaces
            .values()
            .flat_map(|cache| cache.polygons.iter().cloned())
            .collect();
        for (polygon_index, polygon) in polygons.iter_mut().enumerate() {
            polygon.relocate(polygon_index);
        }
        create_nav_links(&mut polygons, self.config.jump_max_length);

        self.update_id += 1;
        NavMesh::new(self.update_id, polygons)
    }
}

/// Obstacles of a walkable surface: footprints of the other polytopes
/// crossing the surface plus the surface self obstacles, merged, simplified
/// and slightly shrunk
fn compute_obstacles(
    config: &NavMeshConfig,
    polytope: &Polytope,
    surface: &PolytopeSurface,
    all_polytopes: &[&Polytope],
) -> Vec<CSGPolygon> {
    let (surface_min, surface_max) = surface.xz_bounds();
    let mut footprints: Vec<CSGPolygon> = Vec::new();

    for obstacle in all_polytopes {
        if obstacle.name() == polytope.name() || !obstacle.is_obstacle_candidate() {
            continue;
        }
        let obstacle_bounds = obstacle.xz_bounds();
        if !overlap_bounds_2d(obstacle_bounds.0, obstacle_bounds.1, surface_min, surface_max) {
            continue;
        }

        if let Some(footprint) = surface
            .footprint_plane(obstacle_bounds)
            .and_then(|plane| obstacle.compute_footprint(&plane))
        {
            footprints.push(footprint);
        }
    }
    footprints.extend(surface.self_obstacles().iter().cloned());

    let mut obstacles = union_polygons(&footprints);
    for obstacle in &mut obstacles {
        obstacle.simplify(config.simplify_angle_cos(), config.polygon_merge_points_distance);
    }
    obstacles.retain(|obstacle| !obstacle.is_empty());
    for obstacle in &mut obstacles {
        obstacle.expand(-config.csg_epsilon);
    }
    obstacles
}

/// Walkable region of a surface with the obstacles fully inside it
struct WalkableRegion {
    outline: CSGPolygon,
    holes: Vec<CSGPolygon>,
}

impl WalkableRegion {
    fn nav_polygon_name(&self) -> String {
        std::iter::once(format!("<{}>", self.outline.name()))
            .chain(self.holes.iter().map(|hole| format!("<{}>", hole.name())))
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

fn is_same_polygon(polygon: &CSGPolygon, other: &CSGPolygon) -> bool {
    polygon.len() == other.len()
        && (polygon.compute_area() - other.compute_area()).abs() <= 1e-6 * polygon.compute_area().max(1.0)
}

fn subtract_obstacle(regions: Vec<WalkableRegion>, obstacle: &CSGPolygon) -> Vec<WalkableRegion> {
    let mut remaining_regions = Vec::with_capacity(regions.len());

    for mut region in regions {
        let (pieces, obstacle_inside) = subtract_polygons(&region.outline, obstacle);
        if obstacle_inside {
            region.holes.push(obstacle.clone());
            remaining_regions.push(region);
        } else if pieces.len() == 1 && is_same_polygon(&pieces[0], &region.outline) {
            remaining_regions.push(region);
        } else {
            for piece in pieces {
                let outline = CSGPolygon::new(
                    format!("[{}] - [{}]", region.outline.name(), obstacle.name()),
                    piece.into_cw_points(),
                );
                let holes = region
                    .holes
                    .iter()
                    .filter(|hole| {
                        hole.cw_points()
                            .first()
                            .is_some_and(|point| outline.point_inside_polygon(*point))
                    })
                    .cloned()
                    .collect();
                remaining_regions.push(WalkableRegion { outline, holes });
            }
        }
    }

    remaining_regions
}

/// Navigation polygons of a walkable surface. Regions which cannot be
/// triangulated are logged and left out.
fn compute_walkable_polygons(
    config: &NavMeshConfig,
    polytope: &Polytope,
    surface: &PolytopeSurface,
    all_polytopes: &[&Polytope],
) -> Vec<NavPolygon> {
    let obstacles = compute_obstacles(config, polytope, surface, all_polytopes);

    let mut outline = CSGPolygon::new(surface.name(), surface.outline_cw_points().to_vec());
    outline.simplify(config.simplify_angle_cos(), config.polygon_merge_points_distance);
    if outline.is_empty() {
        log::warn!("Walkable surface {} is too small to be walked on", surface.name());
        return Vec::new();
    }
    outline.expand(config.csg_epsilon);

    let mut regions = vec![WalkableRegion {
        outline,
        holes: Vec::new(),
    }];
    for obstacle in &obstacles {
        regions = subtract_obstacle(regions, obstacle);
    }

    let mut nav_polygons = Vec::with_capacity(regions.len());
    for region in regions {
        let mut triangulation =
            TriangulationAlgorithm::new(region.outline.ccw_points(), region.outline.name());
        for hole in &region.holes {
            triangulation.add_hole_points(hole.cw_points(), hole.name());
        }

        match triangulation.triangulate() {
            Ok(triangles) => {
                let points = triangulation
                    .all_points()
                    .iter()
                    .map(|point| surface.compute_real_point(*point, &config.agent))
                    .collect();
                nav_polygons.push(NavPolygon::new(region.nav_polygon_name(), points, triangles));
            }
            Err(error) => log::error!(
                "Walkable region {} of surface {} ignored: {}",
                region.outline.name(),
                surface.name(),
                error
            ),
        }
    }

    nav_polygons
}

/// Links the external edges of different polygons: walkable junctions
/// between collinear edges and jumps between close edges
fn create_nav_links(polygons: &mut [NavPolygon], jump_max_length: f32) {
    let detection = EdgeLinkDetection::new(jump_max_length);
    let margin = Vec2::splat(jump_max_length);
    let bounds: Vec<(Vec2, Vec2)> = polygons
        .iter()
        .map(|polygon| {
            let top_points: Vec<Vec2> = polygon.points().iter().map(|p| to_top_view(*p)).collect();
            let (min, max) = bounds_2d(&top_points).unwrap_or((Vec2::ZERO, Vec2::ZERO));
            (min - margin, max + margin)
        })
        .collect();

    // (polygon, triangle, edge, target, constraint, jump)
    let mut new_links: Vec<(usize, usize, usize, NavTriangleRef, NavLinkConstraint, bool)> = Vec::new();
    for (source_index, source_polygon) in polygons.iter().enumerate() {
        for (target_index, target_polygon) in polygons.iter().enumerate() {
            if source_index == target_index {
                continue;
            }
            let (source_min, source_max) = bounds[source_index];
            let (target_min, target_max) = bounds[target_index];
            if !overlap_bounds_2d(source_min, source_max, target_min, target_max) {
                continue;
            }

            for (source_triangle_index, source_triangle) in source_polygon.triangles().iter().enumerate() {
                for source_edge_index in 0..3 {
                    if !source_triangle.is_external_edge(source_edge_index) {
                        continue;
                    }
                    let source_edge = source_polygon.compute_edge(source_triangle_index, source_edge_index);

                    for (target_triangle_index, target_triangle) in
                        target_polygon.triangles().iter().enumerate()
                    {
                        for target_edge_index in 0..3 {
                            if !target_triangle.is_external_edge(target_edge_index) {
                                continue;
                            }
                            let target_edge =
                                target_polygon.compute_edge(target_triangle_index, target_edge_index);
                            let target = NavTriangleRef::new(target_index, target_triangle_index);

                            let (start_range, end_range, jump) =
                                match detection.detect_link(&source_edge, &target_edge) {
                                    EdgeLinkResult::NoLink => continue,
                                    EdgeLinkResult::Collinear {
                                        start_range,
                                        end_range,
                                    } => (start_range, end_range, false),
                                    EdgeLinkResult::Jump {
                                        start_range,
                                        end_range,
                                    } => (start_range, end_range, true),
                                };
                            new_links.push((
                                source_index,
                                source_triangle_index,
                                source_edge_index,
                                target,
                                NavLinkConstraint::new(start_range, end_range, target_edge_index),
                                jump,
                            ));
                        }
                    }
                }
            }
        }
    }

    for (polygon_index, triangle_index, edge_index, target, constraint, jump) in new_links {
        let triangle = &mut polygons[polygon_index].triangles_mut()[triangle_index];
        if jump {
            triangle.add_jump_link(edge_index, target, constraint);
        } else {
            triangle.add_join_polygons_link(edge_index, target, constraint);
        }
    }
}
