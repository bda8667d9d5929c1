mod common;

use common::*;
use livescope_model::TrackedEntity;
use livescope_sync::{ScopeTransition, SyncSnapshot};
use pretty_assertions::assert_eq;
use serde_json::json;

fn capture(tracked: &TrackedEntity) -> SyncSnapshot {
    let registry = make_registry(false);
    let store = make_store();
    SyncSnapshot::capture(tracked, registry.scopes("todo"), store.as_ref())
}

#[test]
fn snapshot_restores_original_values() {
    let mut tracked = TrackedEntity::new(open_todo());
    tracked.set("status", json!("closed"));
    tracked.set("owner_id", json!("B"));

    let snapshot = capture(&tracked);
    let before = snapshot.record_before_update();

    assert_eq!(before.get_str("/status"), Some("open"));
    assert_eq!(before.get_str("/owner_id"), Some("A"));
    assert_eq!(tracked.entity().get_str("/status"), Some("closed"));
}

#[test]
fn snapshot_covers_every_scope_in_order() {
    let tracked = TrackedEntity::new(open_todo());
    let snapshot = capture(&tracked);

    let names: Vec<&str> = snapshot
        .scopes()
        .iter()
        .map(|s| s.scope_before_update.name())
        .collect();
    assert_eq!(names, vec!["open", "by_owner", "by_assignee"]);
    assert!(snapshot.scopes().iter().all(|s| s.contains_record_before));
}

#[test]
fn snapshot_derives_scopes_from_before_record() {
    let mut tracked = TrackedEntity::new(open_todo());
    tracked.set("owner_id", json!("B"));

    let snapshot = capture(&tracked);
    let by_owner = snapshot.scope("by_owner").unwrap();

    assert_eq!(
        by_owner.scope_before_update.channel_id().as_str(),
        "todo:by_owner:\"A\""
    );
    assert!(by_owner.contains_record_before);
}

#[test]
fn snapshot_records_non_membership() {
    let mut tracked = TrackedEntity::new(make_todo(
        "t2",
        json!({"status": "closed", "owner_id": "A"}),
    ));
    tracked.set("status", json!("open"));

    let snapshot = capture(&tracked);

    assert!(!snapshot.scope("open").unwrap().contains_record_before);
    let by_assignee = snapshot.scope("by_assignee").unwrap();
    assert!(!by_assignee.scope_before_update.is_valid());
    assert!(!by_assignee.contains_record_before);
    assert!(snapshot.scope("missing").is_none());
}

#[test]
fn transition_for_owner_shift() {
    let registry = make_registry(false);
    let store = make_store();
    let mut tracked = TrackedEntity::new(open_todo());
    tracked.set("owner_id", json!("B"));

    let snapshot = SyncSnapshot::capture(&tracked, registry.scopes("todo"), store.as_ref());
    let after = tracked.into_entity();
    let before = snapshot.scope("by_owner").unwrap();
    let scope_after = registry
        .derive_scope("by_owner", &after, store.as_ref())
        .unwrap();

    let t = ScopeTransition::evaluate(before, &scope_after, snapshot.record_before_update(), &after);
    assert_eq!(
        t,
        ScopeTransition {
            old_in_old: true,
            old_in_new: false,
            new_in_new: true,
            new_in_old: false,
        }
    );
}

#[test]
fn transition_for_unparameterized_scope_entry() {
    let registry = make_registry(false);
    let store = make_store();
    let mut tracked = TrackedEntity::new(make_todo("t2", json!({"status": "closed"})));
    tracked.set("status", json!("open"));

    let snapshot = SyncSnapshot::capture(&tracked, registry.scopes("todo"), store.as_ref());
    let after = tracked.into_entity();
    let before = snapshot.scope("open").unwrap();
    let scope_after = registry.derive_scope("open", &after, store.as_ref()).unwrap();

    let t = ScopeTransition::evaluate(before, &scope_after, snapshot.record_before_update(), &after);
    assert!(!t.old_in_old);
    assert!(!t.old_in_new);
    assert!(t.new_in_new);
}
