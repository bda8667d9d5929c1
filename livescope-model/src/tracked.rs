use crate::Entity;
use serde_json::{Map, Value};

/// An entity with pending, not yet persisted, attribute changes.
///
/// The first write to an attribute remembers its original value, so the
/// pre-mutation record can be rebuilt without a full historical copy.
/// Writing an attribute back to its original value clears the change.
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    entity: Entity,
    original: Map<String, Value>,
}

impl TrackedEntity {
    /// Starts tracking a freshly loaded entity.
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            original: Map::new(),
        }
    }

    /// The entity as it currently stands, pending changes included.
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Sets an attribute, recording its original value on first change.
    pub fn set(&mut self, name: &str, value: Value) {
        let current = self.entity.attribute(name).cloned().unwrap_or(Value::Null);
        match self.original.get(name) {
            Some(original) if *original == value => {
                self.original.remove(name);
            }
            Some(_) => {}
            None if current == value => return,
            None => {
                self.original.insert(name.to_string(), current);
            }
        }
        self.entity.set_attribute(name, value);
    }

    /// Names of the attributes that differ from their loaded values.
    pub fn changed_attribute_names(&self) -> impl Iterator<Item = &str> {
        self.original.keys().map(String::as_str)
    }

    /// Whether any attribute has changed.
    pub fn is_changed(&self) -> bool {
        !self.original.is_empty()
    }

    /// Original values of the changed attributes.
    pub fn original_values(&self) -> &Map<String, Value> {
        &self.original
    }

    /// A detached copy of the entity with every changed attribute reset to
    /// its original value.
    pub fn record_before_update(&self) -> Entity {
        let mut before = self.entity.clone();
        for (name, value) in &self.original {
            before.set_attribute(name.clone(), value.clone());
        }
        before
    }

    /// Accepts the pending changes, returning the updated entity.
    pub fn into_entity(self) -> Entity {
        self.entity
    }
}

impl From<Entity> for TrackedEntity {
    fn from(entity: Entity) -> Self {
        Self::new(entity)
    }
}
