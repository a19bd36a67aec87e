use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use glam::Vec3;
use polynav_path::PathPoint;

/// Path asked by the simulation and resolved by the AI thread on each
/// cycle.
///
/// The path is written under a lock before the ready flag is raised, so a
/// reader seeing the flag always reads a complete path. An unreachable
/// destination resolves to an empty path.
#[derive(Debug)]
pub struct PathRequest {
    start_point: Vec3,
    end_point: Vec3,
    path: Mutex<Vec<PathPoint>>,
    path_ready: AtomicBool,
}

impl PathRequest {
    pub fn new(start_point: Vec3, end_point: Vec3) -> Self {
        Self {
            start_point,
            end_point,
            path: Mutex::new(Vec::new()),
            path_ready: AtomicBool::new(false),
        }
    }

    pub fn start_point(&self) -> Vec3 {
        self.start_point
    }

    pub fn end_point(&self) -> Vec3 {
        self.end_point
    }

    pub fn set_path(&self, path: Vec<PathPoint>) {
        *self.path.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = path;
        self.path_ready.store(true, Ordering::Release);
    }

    pub fn is_path_ready(&self) -> bool {
        self.path_ready.load(Ordering::Acquire)
    }

    /// Copy of the last computed path
    pub fn path(&self) -> Vec<PathPoint> {
        self.path
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
