//! Pre-mutation snapshots.
//!
//! A snapshot holds what the diff engine needs from before an update: the
//! record as it looked, and for every declared scope the instance derived from
//! that record plus whether the record was a member of it.

use crate::scope::{self, ScopeDefinition, ScopeInstance};
use crate::store::EntityLookup;
use livescope_model::{Entity, TrackedEntity};
use std::sync::Arc;

/// Before-state of one declared scope.
#[derive(Debug, Clone)]
pub struct ScopeSnapshot {
    pub scope_before_update: ScopeInstance,
    pub contains_record_before: bool,
}

/// Before-state of one update, consumed by the diff engine.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    record_before_update: Entity,
    scopes: Vec<ScopeSnapshot>,
}

impl SyncSnapshot {
    /// Captures the before-state of `tracked` for every scope in `definitions`.
    pub fn capture(
        tracked: &TrackedEntity,
        definitions: &[Arc<ScopeDefinition>],
        store: &dyn EntityLookup,
    ) -> Self {
        let record_before_update = tracked.record_before_update();
        let scopes = definitions
            .iter()
            .map(|definition| {
                let scope_before_update = scope::derive(definition, &record_before_update, store);
                let contains_record_before = scope_before_update.contains(&record_before_update);
                ScopeSnapshot {
                    scope_before_update,
                    contains_record_before,
                }
            })
            .collect();
        Self {
            record_before_update,
            scopes,
        }
    }

    pub fn record_before_update(&self) -> &Entity {
        &self.record_before_update
    }

    /// Per-scope before-state, in declaration order.
    pub fn scopes(&self) -> &[ScopeSnapshot] {
        &self.scopes
    }

    /// Before-state of the scope named `name`.
    pub fn scope(&self, name: &str) -> Option<&ScopeSnapshot> {
        self.scopes
            .iter()
            .find(|s| s.scope_before_update.name() == name)
    }
}
