//! 2D constructive solid geometry on simple polygons

mod boolean;
mod polygon;

pub use boolean::*;
pub use polygon::*;
