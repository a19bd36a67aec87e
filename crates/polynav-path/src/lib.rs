//! Pathfinding over polynav navigation meshes
//!
//! [`PathfindingAStar`] searches the triangles of a [`polynav::NavMesh`]
//! through their links, then [`FunnelAlgorithm`] pulls the path tight
//! through the crossed portals. Jump links split the path in independent
//! corridors.

mod astar;
mod funnel;
mod path_point;
mod path_portal;

pub use astar::*;
pub use funnel::*;
pub use path_point::*;
pub use path_portal::*;
