#![allow(dead_code)]

use livescope_model::{Entity, EntitySchema, IndexedField, TrackedEntity};
use livescope_sync::transport::mock::RecordingPublisher;
use livescope_sync::{
    Action, FilterExpr, MemoryStore, Operand, ScopeRegistry, SyncContext, SyncEngine,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn todo_schema() -> EntitySchema {
    EntitySchema::new(
        "todo",
        vec![
            IndexedField::text("/title"),
            IndexedField::text("/status"),
            IndexedField::number("/priority"),
            IndexedField::text("/owner_id"),
            IndexedField::relation("/project", "project"),
            IndexedField::relation("/assignee", "user"),
        ],
    )
}

pub fn project_schema() -> EntitySchema {
    EntitySchema::new("project", vec![IndexedField::text("/name")])
}

pub fn user_schema() -> EntitySchema {
    EntitySchema::new("user", vec![IndexedField::text("/name")])
}

/// `todo` with scopes `open`, `by_owner(owner_id)` and `by_assignee(assignee)`.
pub fn make_registry(with_default_scope: bool) -> Arc<ScopeRegistry> {
    let mut builder = ScopeRegistry::builder();
    builder
        .register_type(todo_schema())
        .unwrap()
        .register_type(project_schema())
        .unwrap()
        .register_type(user_schema())
        .unwrap()
        .declare_scope(
            "todo",
            "open",
            &[],
            FilterExpr::eq("status", Operand::literal("open")),
        )
        .unwrap()
        .declare_scope(
            "todo",
            "by_owner",
            &["owner_id"],
            FilterExpr::eq("owner_id", Operand::param("owner_id")),
        )
        .unwrap()
        .declare_scope(
            "todo",
            "by_assignee",
            &["assignee"],
            FilterExpr::eq("assignee", Operand::param("assignee")),
        )
        .unwrap();
    if with_default_scope {
        builder.default_scope("todo", "project").unwrap();
    }
    Arc::new(builder.build())
}

pub fn make_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .save_entity(&Entity::new("p1", "project", json!({"name": "Launch"})))
        .unwrap();
    store
        .save_entity(&Entity::new("u1", "user", json!({"name": "Ada"})))
        .unwrap();
    store
        .save_entity(&Entity::new("u2", "user", json!({"name": "Grace"})))
        .unwrap();
    store
}

pub fn make_engine(
    registry: Arc<ScopeRegistry>,
    store: Arc<MemoryStore>,
) -> (SyncEngine, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::new());
    let engine = SyncEngine::new(registry, store, publisher.clone());
    (engine, publisher)
}

pub fn make_todo(id: &str, data: Value) -> Entity {
    Entity::new(id, "todo", data)
}

/// An open todo owned by `A`, in project `p1`, assigned to `u1`.
pub fn open_todo() -> Entity {
    make_todo(
        "t1",
        json!({
            "title": "Write docs",
            "status": "open",
            "priority": 2,
            "owner_id": "A",
            "project": "p1",
            "assignee": "u1",
        }),
    )
}

/// Runs one update through the engine and returns the queued actions.
pub fn run_update(
    engine: &SyncEngine,
    store: &MemoryStore,
    ctx: &SyncContext,
    entity: &Entity,
    changes: &[(&str, Value)],
) -> Vec<Action> {
    let mut uow = engine.begin(ctx);
    let mut tracked = TrackedEntity::new(entity.clone());
    for (name, value) in changes {
        tracked.set(name, value.clone());
    }
    let snapshot = engine.before_update(&uow, &tracked);
    let after = tracked.into_entity();
    store.save_entity(&after).unwrap();
    engine.after_update(&mut uow, snapshot, &after);
    let actions = uow.queue().iter().cloned().collect();
    uow.rollback();
    actions
}

/// Actions targeting the named scope `name`.
pub fn scope_actions<'a>(actions: &'a [Action], name: &str) -> Vec<&'a Action> {
    actions
        .iter()
        .filter(|a| a.named_scope().is_some_and(|s| s.name() == name))
        .collect()
}
