//! Triangulation of polygons with holes
//!
//! The polygon is first split into y-monotone pieces, then each piece is
//! triangulated with a stack sweep. Both steps follow "Computational
//! Geometry - Algorithms and Applications", chapter 3.

mod monotone;
mod triangulate;

pub use monotone::*;
pub use triangulate::*;
