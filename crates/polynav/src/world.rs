use std::sync::Arc;

use crate::AIEntity;

/// Entities known by the AI, plus the entities removed since the last
/// generation so the generator can drop their polytopes
#[derive(Debug, Default, Clone)]
pub struct AIWorld {
    entities: Vec<Arc<AIEntity>>,
    entities_to_remove: Vec<Arc<AIEntity>>,
}

impl AIWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entity(&mut self, entity: Arc<AIEntity>) {
        self.entities_to_remove
            .retain(|removed| !Arc::ptr_eq(removed, &entity));
        entity.mark_to_rebuild();
        self.entities.push(entity);
    }

    /// Returns false when the entity is not part of the world
    pub fn remove_entity(&mut self, entity: &Arc<AIEntity>) -> bool {
        match self.entities.iter().position(|e| Arc::ptr_eq(e, entity)) {
            Some(index) => {
                let removed = self.entities.remove(index);
                self.entities_to_remove.push(removed);
                true
            }
            None => false,
        }
    }

    pub fn entities(&self) -> &[Arc<AIEntity>] {
        &self.entities
    }

    pub fn take_entities_to_remove(&mut self) -> Vec<Arc<AIEntity>> {
        std::mem::take(&mut self.entities_to_remove)
    }

    /// Copy of the entities which drains the removed ones. Lets the AI
    /// thread release the world lock before generating.
    pub fn snapshot(&mut self) -> AIWorld {
        AIWorld {
            entities: self.entities.clone(),
            entities_to_remove: self.take_entities_to_remove(),
        }
    }
}
