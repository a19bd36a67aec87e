//! AI environment running navigation mesh generation and pathfinding on a
//! background thread
//!
//! The simulation adds entities, moves them and registers path requests
//! from its own thread. The AI thread regenerates what changed at a fixed
//! time step and resolves every registered request against the fresh mesh.

mod environment;
mod path_request;

#[cfg(test)]
mod environment_tests;

pub use environment::*;
pub use path_request::*;
