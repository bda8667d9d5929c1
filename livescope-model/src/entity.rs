use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A generic entity owned by the host's entity store.
///
/// Attributes live as top-level keys of the `data` object. A relation is an
/// attribute holding the related entity's id; the owning [`EntitySchema`]
/// says which attributes are relations and what type they point at.
///
/// [`EntitySchema`]: crate::EntitySchema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub entity_type: String,
    pub data: Value,
    pub created_at: i64,
    pub modified_at: i64,
}

impl Entity {
    /// Creates an entity with empty timestamps.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            data,
            created_at: 0,
            modified_at: 0,
        }
    }

    /// Returns a top-level attribute, or `None` if the key is absent.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Writes a top-level attribute. Non-object `data` is replaced by an object.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        if !self.data.is_object() {
            self.data = Value::Object(serde_json::Map::new());
        }
        if let Some(obj) = self.data.as_object_mut() {
            obj.insert(name.into(), value);
        }
    }

    /// Returns the id stored in a relation attribute, if it is a string.
    pub fn related_id(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|v| v.as_str())
    }

    /// Extract a string value from `data` using a JSON pointer (e.g., "/title").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.data.pointer(pointer).and_then(|v| v.as_str())
    }
}
