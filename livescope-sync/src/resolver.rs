//! Resolves scope parameters against a record.

use crate::scope::{ParamKind, ScopeArg, ScopeParam};
use crate::store::EntityLookup;
use livescope_model::Entity;
use serde_json::Value;
use tracing::{debug, warn};

/// Resolves `param` against `entity`.
///
/// Attributes always resolve; an absent key reads as JSON null. Relations
/// resolve to the related record, or to `None` when the id is missing, is not
/// a string, names no stored record, or the store fails. `None` is never an
/// error: it marks the scope instance invalid so it contributes no actions.
pub fn resolve(entity: &Entity, param: &ScopeParam, store: &dyn EntityLookup) -> Option<ScopeArg> {
    match &param.kind {
        ParamKind::Attribute => Some(ScopeArg::Value(
            entity.attribute(&param.name).cloned().unwrap_or(Value::Null),
        )),
        ParamKind::Relation { target_type } => {
            let Some(id) = entity.related_id(&param.name) else {
                debug!(
                    "Relation {} on {}#{} is unset",
                    param.name, entity.entity_type, entity.id
                );
                return None;
            };
            match store.find(target_type, id) {
                Ok(Some(related)) => Some(ScopeArg::record(&related)),
                Ok(None) => {
                    debug!("Related {target_type}#{id} not found for {}", param.name);
                    None
                }
                Err(e) => {
                    warn!("Failed to load related {target_type}#{id}: {e}");
                    None
                }
            }
        }
    }
}

/// Fetches the record a relation attribute points at.
pub fn related(
    entity: &Entity,
    relation: &str,
    target_type: &str,
    store: &dyn EntityLookup,
) -> Option<Entity> {
    let id = entity.related_id(relation)?;
    match store.find(target_type, id) {
        Ok(found) => found,
        Err(e) => {
            warn!("Failed to load related {target_type}#{id}: {e}");
            None
        }
    }
}
