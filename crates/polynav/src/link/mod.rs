//! Detection of links between edges of different navigation polygons

mod edge_link_detection;

pub use edge_link_detection::*;
