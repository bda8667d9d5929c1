//! Entity store abstraction.
//!
//! The engine never writes entities. It only needs to look up related
//! records while resolving relation parameters, and to reload a default-scope
//! parent after a mutation.

use crate::error::{SyncError, SyncResult};
use livescope_model::Entity;
use std::collections::HashMap;
use std::sync::RwLock;

/// Read access to the host's entity store.
pub trait EntityLookup: Send + Sync {
    /// Fetches an entity by type and id.
    fn find(&self, entity_type: &str, id: &str) -> SyncResult<Option<Entity>>;

    /// Reloads `entity` from the store.
    fn reload(&self, entity: &Entity) -> SyncResult<Option<Entity>> {
        self.find(&entity.entity_type, &entity.id)
    }
}

/// A map-backed store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<HashMap<(String, String), Entity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entity.
    pub fn save_entity(&self, entity: &Entity) -> SyncResult<()> {
        let mut entities = self
            .entities
            .write()
            .map_err(|_| SyncError::Storage("memory store lock poisoned".into()))?;
        entities.insert(
            (entity.entity_type.clone(), entity.id.clone()),
            entity.clone(),
        );
        Ok(())
    }

    /// Removes an entity. Returns whether it existed.
    pub fn delete_entity(&self, entity_type: &str, id: &str) -> SyncResult<bool> {
        let mut entities = self
            .entities
            .write()
            .map_err(|_| SyncError::Storage("memory store lock poisoned".into()))?;
        Ok(entities
            .remove(&(entity_type.to_string(), id.to_string()))
            .is_some())
    }

    pub fn len(&self) -> usize {
        self.entities.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityLookup for MemoryStore {
    fn find(&self, entity_type: &str, id: &str) -> SyncResult<Option<Entity>> {
        let entities = self
            .entities
            .read()
            .map_err(|_| SyncError::Storage("memory store lock poisoned".into()))?;
        Ok(entities
            .get(&(entity_type.to_string(), id.to_string()))
            .cloned())
    }
}
