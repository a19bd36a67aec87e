//! Polytopes: shapes of the world expanded by the agent size.
//!
//! Once expanded, the agent can be considered as a point: walkable surfaces
//! hold the positions its center can reach and obstacle hulls the volume it
//! cannot enter.

mod builder;
mod solid;
mod surface;
mod terrain_obstacles;
mod terrain_surface;

pub use builder::*;
pub use solid::*;
pub use surface::*;
pub use terrain_obstacles::*;
pub use terrain_surface::*;
