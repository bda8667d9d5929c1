use livescope_sync::SyncContext;
use livescope_sync::context;
use serde_json::json;

#[test]
fn outside_any_scope_sync_is_disabled() {
    assert!(!context::is_enabled());
    assert_eq!(context::current(), SyncContext::disabled());
}

#[test]
fn sync_scope_sets_and_restores() {
    let ctx = SyncContext::enabled().with_render_context(json!({"locale": "en"}));
    let seen = context::sync_scope(ctx.clone(), context::current);

    assert_eq!(seen, ctx);
    assert!(!context::is_enabled());
}

#[test]
fn nested_scope_restores_outer_context() {
    context::sync_scope(SyncContext::enabled(), || {
        assert!(context::is_enabled());
        context::sync_scope(SyncContext::disabled(), || {
            assert!(!context::is_enabled());
        });
        assert!(context::is_enabled());
    });
}

#[test]
fn panic_inside_scope_does_not_leak_state() {
    let result = std::panic::catch_unwind(|| {
        context::sync_scope(SyncContext::enabled(), || {
            assert!(!context::is_enabled(), "boom");
        });
    });
    assert!(result.is_err());
    assert!(!context::is_enabled());
}

#[tokio::test]
async fn async_scope_spans_awaits() {
    let ctx = SyncContext::enabled();
    let enabled = context::scope(ctx, async {
        tokio::task::yield_now().await;
        context::is_enabled()
    })
    .await;

    assert!(enabled);
    assert!(!context::is_enabled());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_tasks_keep_their_own_context() {
    let mut handles = Vec::new();
    for i in 0..8 {
        let ctx = if i % 2 == 0 {
            SyncContext::enabled().with_render_context(json!({ "task": i }))
        } else {
            SyncContext::disabled()
        };
        handles.push(tokio::spawn(context::scope(ctx, async move {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            (i, context::current())
        })));
    }

    for handle in handles {
        let (i, seen) = handle.await.unwrap();
        if i % 2 == 0 {
            assert!(seen.is_enabled());
            assert_eq!(seen.render_context(), Some(&json!({ "task": i })));
        } else {
            assert!(!seen.is_enabled());
        }
    }
}

#[tokio::test]
async fn spawned_task_does_not_inherit_context() {
    let inner = context::scope(SyncContext::enabled(), async {
        tokio::spawn(async { context::is_enabled() }).await.unwrap()
    })
    .await;
    assert!(!inner);
}
