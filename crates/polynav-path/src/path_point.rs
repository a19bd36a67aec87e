use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Point of a computed path. `jump` marks the point where the character
/// takes off to reach the next point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub point: Vec3,
    pub jump: bool,
}

impl PathPoint {
    pub fn new(point: Vec3, jump: bool) -> Self {
        Self { point, jump }
    }
}
