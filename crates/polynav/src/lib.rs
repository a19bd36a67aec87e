//! Navigation mesh generation from convex shapes and heightfield terrains
//!
//! Shapes of the [`AIWorld`] are expanded by the agent size into polytopes.
//! The walkable surfaces of the polytopes are then cut by the footprints of
//! the obstacles standing on them, triangulated and linked together into a
//! [`NavMesh`]. Generation is incremental: [`NavMeshGenerator`] only
//! recomputes what the moved, added or removed entities touch.

mod agent;
mod config;
mod csg;
pub mod debug;
mod entity;
mod generator;
mod link;
mod model;
mod polytope;
mod shape;
mod triangulation;
mod world;

#[cfg(test)]
mod generator_tests;

pub use agent::NavMeshAgent;
pub use config::NavMeshConfig;
pub use csg::{intersect_polygons, is_cw_points, subtract_polygons, union_polygons, CSGPolygon};
pub use entity::{AIEntity, AIEntityKind, AIObject, AITerrain};
pub use generator::{NavMeshGenerator, SharedNavMesh};
pub use link::{EdgeLinkDetection, EdgeLinkResult};
pub use model::*;
pub use polytope::{
    ObstacleHull, Polytope, PolytopeBuilder, PolytopePlaneSurface, PolytopeSurface,
    PolytopeTerrainSurface, TerrainObstacleService,
};
pub use shape::{AIShape, Axis, ObjectShape, Transform};
pub use triangulation::*;
pub use world::AIWorld;

pub use polynav_common::{Error, Result};
