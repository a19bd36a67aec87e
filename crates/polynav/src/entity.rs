use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use glam::{Quat, Vec3};

use crate::{ObjectShape, Transform};

/// Object made of one or several collision shapes
#[derive(Debug, Clone, PartialEq)]
pub struct AIObject {
    pub shapes: Vec<ObjectShape>,
}

impl AIObject {
    pub fn new(shapes: Vec<ObjectShape>) -> Self {
        Self { shapes }
    }
}

/// Heightfield terrain: `x_length * z_length` vertices stored row by row,
/// from the far (smallest z) row to the near one, each row from the
/// smallest x to the biggest.
#[derive(Debug, Clone, PartialEq)]
pub struct AITerrain {
    pub local_vertices: Vec<Vec3>,
    pub x_length: usize,
    pub z_length: usize,
}

impl AITerrain {
    pub fn new(local_vertices: Vec<Vec3>, x_length: usize, z_length: usize) -> Self {
        debug_assert_eq!(local_vertices.len(), x_length * z_length);
        Self {
            local_vertices,
            x_length,
            z_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AIEntityKind {
    Object(AIObject),
    Terrain(AITerrain),
}

/// Entity of the AI world.
///
/// The transform is written by the simulation thread and read by the AI
/// thread, hence the lock. `to_rebuild` is a lock free flag: it is set after
/// each transform update and only cleared by the AI thread right before it
/// copies the transform, so an update is at worst processed one cycle late.
#[derive(Debug)]
pub struct AIEntity {
    name: String,
    kind: AIEntityKind,
    transform: Mutex<Transform>,
    to_rebuild: AtomicBool,
    obstacle_candidate: bool,
}

impl AIEntity {
    pub fn new_object(
        name: impl Into<String>,
        transform: Transform,
        obstacle_candidate: bool,
        shapes: Vec<ObjectShape>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AIEntityKind::Object(AIObject::new(shapes)),
            transform: Mutex::new(transform),
            to_rebuild: AtomicBool::new(true),
            obstacle_candidate,
        }
    }

    /// A terrain has no obstacle hull: even as an obstacle candidate it never
    /// cuts other walkable surfaces
    pub fn new_terrain(
        name: impl Into<String>,
        transform: Transform,
        obstacle_candidate: bool,
        terrain: AITerrain,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AIEntityKind::Terrain(terrain),
            transform: Mutex::new(transform),
            to_rebuild: AtomicBool::new(true),
            obstacle_candidate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AIEntityKind {
        &self.kind
    }

    pub fn is_obstacle_candidate(&self) -> bool {
        self.obstacle_candidate
    }

    pub fn update_transform(&self, position: Vec3, orientation: Quat) {
        {
            let mut transform = self
                .transform
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *transform = Transform::new(position, orientation);
        }
        self.to_rebuild.store(true, Ordering::Release);
    }

    /// Copy of the current transform
    pub fn transform(&self) -> Transform {
        *self
            .transform
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_to_rebuild(&self) -> bool {
        self.to_rebuild.load(Ordering::Acquire)
    }

    /// Clears the rebuild flag. Must be called before reading the transform
    /// used for the rebuild.
    pub fn mark_rebuilt(&self) {
        self.to_rebuild.store(false, Ordering::Release);
    }

    /// Requests a new rebuild, used when a rebuild could not complete
    pub fn mark_to_rebuild(&self) {
        self.to_rebuild.store(true, Ordering::Release);
    }
}
