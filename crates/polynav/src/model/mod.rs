//! Output model of the generator: navigation mesh, polygons, triangles and links
//!
//! Triangles reference each other through [`NavTriangleRef`] arena indices
//! into [`NavMesh::polygons`], so a built mesh is plain data that can be
//! cloned, shared behind an `Arc` and serialized.

mod nav_link;
mod nav_mesh;
mod nav_polygon;
mod nav_triangle;

pub use nav_link::*;
pub use nav_mesh::*;
pub use nav_polygon::*;
pub use nav_triangle::*;
