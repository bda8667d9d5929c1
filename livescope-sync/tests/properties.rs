//! Property tests for action fan-out.
//!
//! - Creation and destruction emit one action per declared scope whose
//!   arguments resolve, plus the primary action and the parent refresh when
//!   a default scope resolves.
//! - Subscriber-bound and record-derived scopes agree on channel identity,
//!   including numbers written as integers or floats.
//! - Updates emit exactly the membership transitions for each scope.

mod common;

use common::*;
use livescope_sync::{ActionKind, FilterExpr, Operand, ScopeArg, ScopeRegistry, SyncContext};
use proptest::prelude::*;
use serde_json::{Value, json};

fn arb_status() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("open"), Just("closed"), Just("blocked")]
}

fn arb_owner() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("A"), Just("B"), Just("C")]
}

fn arb_assignee() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("u1")), Just(Some("u2")), Just(Some("ghost"))]
}

fn todo_data(status: &str, owner: &str, assignee: Option<&str>) -> Value {
    let mut data = json!({"status": status, "owner_id": owner, "project": "p1"});
    if let Some(assignee) = assignee {
        data["assignee"] = json!(assignee);
    }
    data
}

fn priority_registry() -> ScopeRegistry {
    let mut builder = ScopeRegistry::builder();
    builder.register_type(todo_schema()).unwrap();
    builder
        .declare_scope(
            "todo",
            "by_priority",
            &["priority"],
            FilterExpr::eq("priority", Operand::param("priority")),
        )
        .unwrap();
    builder.build()
}

proptest! {
    /// Property: lifecycle fan-out size depends only on the registry
    #[test]
    fn prop_lifecycle_action_counts(
        status in arb_status(),
        owner in arb_owner(),
        assignee in arb_assignee(),
        with_default in any::<bool>(),
    ) {
        let store = make_store();
        let (engine, _) = make_engine(make_registry(with_default), store.clone());
        let todo = make_todo("t1", todo_data(status, owner, assignee));
        let resolvable = usize::from(matches!(assignee, Some("u1" | "u2")));
        let expected = 1 + usize::from(with_default) + 2 + resolvable;

        let mut uow = engine.begin(&SyncContext::enabled());
        engine.after_create(&mut uow, &todo);
        prop_assert_eq!(uow.queue().len(), expected);
        prop_assert!(uow.queue().iter().all(|a| !a.channel_id().as_str().ends_with('?')));
        prop_assert!(uow.queue().iter().filter(|a| a.named_scope().is_some()).all(|a| a.kind == ActionKind::New));
        uow.rollback();

        let mut uow = engine.begin(&SyncContext::enabled());
        engine.after_destroy(&mut uow, &todo);
        prop_assert_eq!(uow.queue().len(), expected);
        uow.rollback();
    }

    /// Property: bound and derived scopes share channel identity
    #[test]
    fn prop_bound_and_derived_channels_agree(owner in "[a-zA-Z0-9 ]{0,12}") {
        let registry = make_registry(false);
        let store = make_store();
        let todo = make_todo("t1", json!({"owner_id": owner.clone()}));

        let derived = registry.derive_scope("by_owner", &todo, store.as_ref()).unwrap();
        let bound = registry
            .bind_scope("todo", "by_owner", vec![ScopeArg::value(owner)])
            .unwrap();
        let again = registry.derive_scope("by_owner", &todo, store.as_ref()).unwrap();

        prop_assert_eq!(derived.channel_id(), bound.channel_id());
        prop_assert_eq!(derived.channel_id(), again.channel_id());
        prop_assert!(bound.contains(&todo));
    }

    /// Property: integral numbers share a channel however they are written
    #[test]
    fn prop_numeric_arguments_agree(priority in -1_000_000i64..1_000_000, as_float in any::<bool>()) {
        let registry = priority_registry();
        let store = make_store();
        let stored = if as_float { json!(priority as f64) } else { json!(priority) };
        let todo = make_todo("t1", json!({"priority": stored}));

        let derived = registry.derive_scope("by_priority", &todo, store.as_ref()).unwrap();
        let from_int = registry
            .bind_scope("todo", "by_priority", vec![ScopeArg::value(priority)])
            .unwrap();
        let from_float = registry
            .bind_scope("todo", "by_priority", vec![ScopeArg::value(priority as f64)])
            .unwrap();

        prop_assert_eq!(derived.channel_id(), from_int.channel_id());
        prop_assert_eq!(derived.channel_id(), from_float.channel_id());
        prop_assert!(from_float.contains(&todo));
    }

    /// Property: update actions on `open` follow membership exactly
    #[test]
    fn prop_open_scope_transitions(before in arb_status(), after in arb_status()) {
        let store = make_store();
        let (engine, _) = make_engine(make_registry(false), store.clone());
        let todo = make_todo("t1", todo_data(before, "A", None));

        let actions = run_update(
            &engine,
            &store,
            &SyncContext::enabled(),
            &todo,
            &[("status", json!(after))],
        );
        let kinds: Vec<ActionKind> = scope_actions(&actions, "open").iter().map(|a| a.kind).collect();

        let expected = match (before == "open", after == "open") {
            (true, false) => vec![ActionKind::Destroy],
            (false, true) => vec![ActionKind::New],
            _ => vec![],
        };
        prop_assert_eq!(kinds, expected);
    }

    /// Property: an argument shift moves the record between channels
    #[test]
    fn prop_owner_shift_transitions(before in arb_owner(), after in arb_owner()) {
        let store = make_store();
        let (engine, _) = make_engine(make_registry(false), store.clone());
        let todo = make_todo("t1", todo_data("open", before, None));

        let actions = run_update(
            &engine,
            &store,
            &SyncContext::enabled(),
            &todo,
            &[("owner_id", json!(after))],
        );
        let by_owner = scope_actions(&actions, "by_owner");

        if before == after {
            prop_assert!(by_owner.is_empty());
        } else {
            let kinds: Vec<ActionKind> = by_owner.iter().map(|a| a.kind).collect();
            prop_assert_eq!(kinds, vec![ActionKind::Destroy, ActionKind::New]);
            prop_assert_eq!(by_owner[0].record().get_str("/owner_id"), Some(before));
            prop_assert_eq!(by_owner[1].record().get_str("/owner_id"), Some(after));
        }
    }

    /// Property: a disabled context never queues anything
    #[test]
    fn prop_disabled_context_is_inert(
        status in arb_status(),
        owner in arb_owner(),
        with_default in any::<bool>(),
    ) {
        let store = make_store();
        let (engine, _) = make_engine(make_registry(with_default), store.clone());
        let todo = make_todo("t1", todo_data(status, owner, Some("u1")));
        let ctx = SyncContext::disabled();

        let mut uow = engine.begin(&ctx);
        engine.after_create(&mut uow, &todo);
        engine.after_destroy(&mut uow, &todo);
        prop_assert!(uow.queue().is_empty());

        let actions = run_update(&engine, &store, &ctx, &todo, &[("owner_id", json!("Z"))]);
        prop_assert!(actions.is_empty());
    }
}
