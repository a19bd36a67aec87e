//! Common error type and geometry primitives shared by the polynav crates
//!
//! Coordinates follow a Y-up convention. Most 2D operations work on the
//! horizontal plane projected as `(x, -z)`, which keeps clockwise polygons
//! clockwise when seen from above.

pub mod debug;
mod geometry;
mod line;
mod math;
mod plane;

pub use geometry::*;
pub use line::*;
pub use math::*;
pub use plane::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Represents a 2D position, usually `(x, -z)` of a 3D point
pub type Vec2 = glam::Vec2;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The caller broke a contract: unsupported shape, invalid settings,
    /// environment started twice. Aborts the current operation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An algorithm could not resolve its input. The affected region is
    /// dropped and processing continues.
    #[error("geometric degeneracy: {0}")]
    GeometricDegeneracy(String),

    #[error("pathfinding failed: {0}")]
    Pathfinding(String),

    #[error("AI thread failure: {0}")]
    Thread(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true when the error only invalidates a single region
    pub fn is_degeneracy(&self) -> bool {
        matches!(self, Error::GeometricDegeneracy(_))
    }
}

/// Result type for polynav operations
pub type Result<T> = std::result::Result<T, Error>;
