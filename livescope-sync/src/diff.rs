//! Transition classification.
//!
//! Turns a mutation into the actions each affected channel needs. A scope's
//! arguments may themselves come from mutated attributes, so an update is
//! diffed against both the before-parameterized and the after-parameterized
//! instance of every scope, never against a single fixed filter.

use crate::action::{Action, ActionKind, ActionScope, ActionTarget};
use crate::scope::ScopeInstance;
use crate::snapshot::{ScopeSnapshot, SyncSnapshot};
use livescope_model::Entity;
use tracing::debug;

/// Membership of the before and after records in the before and after
/// instances of one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeTransition {
    pub old_in_old: bool,
    pub old_in_new: bool,
    pub new_in_new: bool,
    pub new_in_old: bool,
}

impl ScopeTransition {
    /// `old_in_old` comes from the snapshot; the rest are evaluated now.
    pub fn evaluate(
        before: &ScopeSnapshot,
        scope_after_update: &ScopeInstance,
        record_before: &Entity,
        record_after: &Entity,
    ) -> Self {
        Self {
            old_in_old: before.contains_record_before,
            old_in_new: scope_after_update.contains(record_before),
            new_in_new: scope_after_update.contains(record_after),
            new_in_old: before.scope_before_update.contains(record_after),
        }
    }
}

/// Actions for a newly created record.
pub fn creation_actions(
    entity: &Entity,
    default_scope: Option<&Entity>,
    scopes: Vec<ScopeInstance>,
) -> Vec<Action> {
    lifecycle_actions(entity, ActionKind::New, default_scope, scopes)
}

/// Actions for a destroyed record.
pub fn destruction_actions(
    entity: &Entity,
    default_scope: Option<&Entity>,
    scopes: Vec<ScopeInstance>,
) -> Vec<Action> {
    lifecycle_actions(entity, ActionKind::Destroy, default_scope, scopes)
}

fn lifecycle_actions(
    entity: &Entity,
    kind: ActionKind,
    default_scope: Option<&Entity>,
    scopes: Vec<ScopeInstance>,
) -> Vec<Action> {
    let mut actions = Vec::with_capacity(scopes.len() + 2);
    let target = || ActionTarget::Record(entity.clone());

    match default_scope {
        Some(parent) => {
            actions.push(Action::new(target(), kind, ActionScope::Parent(parent.clone())));
            // The aggregate itself changed.
            actions.push(Action::new(
                ActionTarget::Record(parent.clone()),
                ActionKind::Update,
                ActionScope::Primary,
            ));
        }
        None => actions.push(Action::new(target(), kind, ActionScope::Primary)),
    }

    // An unresolved argument leaves no channel anyone can subscribe to.
    for scope in scopes.into_iter().filter(ScopeInstance::is_valid) {
        actions.push(
            Action::new(target(), kind, ActionScope::Named(scope))
                .with_default_scope(default_scope.cloned()),
        );
    }
    actions
}

/// Primary-channel action for an update.
pub fn primary_update_action(
    snapshot: &SyncSnapshot,
    record_after: &Entity,
    default_scope: Option<&Entity>,
) -> Action {
    let target = match default_scope {
        Some(parent) => ActionTarget::Nested {
            record: snapshot.record_before_update().clone(),
            parent: parent.clone(),
        },
        None => ActionTarget::Record(record_after.clone()),
    };
    Action::new(target, ActionKind::Update, ActionScope::Primary)
}

/// Actions one declared scope needs after an update: zero, one, or two.
///
/// The before-instance and the after-instance are judged independently, and an
/// invalid instance never contributes:
/// - before: the record left it (`old_in_old && !new_in_old`) gives `destroy`
///   with the before-record; otherwise, if the before-record only matches the
///   after-instance (`old_in_new && !old_in_old`), the before channel gets an
///   `update` with the after-record, not a `new`.
/// - after: the record is there now but the before-record was not
///   (`new_in_new && !old_in_new`) gives `new`.
///
/// A record that stays in an unchanged channel produces nothing here; the
/// primary update already carries the refreshed fragment.
pub fn scope_update_actions(
    before: &ScopeSnapshot,
    scope_after_update: &ScopeInstance,
    record_before: &Entity,
    record_after: &Entity,
    default_scope: Option<&Entity>,
) -> Vec<Action> {
    let t = ScopeTransition::evaluate(before, scope_after_update, record_before, record_after);
    let scope_before_update = &before.scope_before_update;
    debug!(
        "Scope {} -> {}: {:?}",
        scope_before_update.channel_id(),
        scope_after_update.channel_id(),
        t
    );

    let mut actions = Vec::new();
    let named = |target: &Entity, kind: ActionKind, scope: &ScopeInstance| {
        Action::new(
            ActionTarget::Record(target.clone()),
            kind,
            ActionScope::Named(scope.clone()),
        )
        .with_default_scope(default_scope.cloned())
    };

    if scope_before_update.is_valid() {
        if t.old_in_old && !t.new_in_old {
            actions.push(named(record_before, ActionKind::Destroy, scope_before_update));
        } else if t.old_in_new && !t.old_in_old {
            actions.push(named(record_after, ActionKind::Update, scope_before_update));
        }
    }

    if scope_after_update.is_valid() && t.new_in_new && !t.old_in_new {
        actions.push(named(record_after, ActionKind::New, scope_after_update));
    }

    actions
}
