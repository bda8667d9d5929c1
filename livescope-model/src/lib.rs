//! Entity model for livescope.
//!
//! Defines the types the scope engine reads from the host's entity store:
//! - [`Entity`]: the generic record (id, type, JSON attributes, timestamps)
//! - [`EntitySchema`]: declares an entity type's attributes and relations
//! - [`TrackedEntity`]: an entity plus the original values of its pending changes
//!
//! The schema is what scope declarations are checked against: every scope
//! parameter must name either an attribute or a relation field of its owner.

mod entity;
mod schema;
mod tracked;

pub use entity::Entity;
pub use schema::{EntitySchema, FieldType, IndexedField};
pub use tracked::TrackedEntity;
