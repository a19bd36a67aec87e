//! JSON scene description loaded by the CLI

use anyhow::{bail, Context, Result};
use glam::Vec3;
use polynav::{AITerrain, AIEntity, AIWorld, NavMeshConfig, ObjectShape, Transform};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Generator settings and the entities to build the navigation mesh from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub config: NavMeshConfig,
    pub entities: Vec<SceneEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntity {
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(flatten)]
    pub kind: SceneEntityKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneEntityKind {
    Object {
        #[serde(default = "default_obstacle")]
        obstacle: bool,
        shapes: Vec<ObjectShape>,
    },
    Terrain {
        #[serde(default)]
        obstacle: bool,
        vertices: Vec<Vec3>,
        x_length: usize,
        z_length: usize,
    },
}

fn default_obstacle() -> bool {
    true
}

impl Scene {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file: {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid scene file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// World holding one entity per scene entity
    pub fn to_world(&self) -> Result<AIWorld> {
        let mut world = AIWorld::new();
        for entity in &self.entities {
            log::debug!("Adding scene entity {}", entity.name);
            world.add_entity(Arc::new(entity.to_entity()?));
        }
        Ok(world)
    }
}

impl SceneEntity {
    fn to_entity(&self) -> Result<AIEntity> {
        match &self.kind {
            SceneEntityKind::Object { obstacle, shapes } => Ok(AIEntity::new_object(
                self.name.clone(),
                self.transform,
                *obstacle,
                shapes.clone(),
            )),
            SceneEntityKind::Terrain {
                obstacle,
                vertices,
                x_length,
                z_length,
            } => {
                if *x_length < 2 || *z_length < 2 || vertices.len() != x_length * z_length {
                    bail!(
                        "Terrain {} needs at least 2x2 vertices and exactly {}x{} of them, got {}",
                        self.name,
                        x_length,
                        z_length,
                        vertices.len()
                    );
                }
                Ok(AIEntity::new_terrain(
                    self.name.clone(),
                    self.transform,
                    *obstacle,
                    AITerrain::new(vertices.clone(), *x_length, *z_length),
                ))
            }
        }
    }
}
