//! Sync context: whether syncing is active for a unit of work, and the
//! rendering context handed to publishers.
//!
//! The context is a plain value passed into every engine call. Hosts that
//! would rather not thread it through their call stack can carry it in task-local
//! storage with [`scope`] / [`sync_scope`] and read it back with [`current`].
//! Both restore the outer state when the wrapped work finishes, including on
//! panic.

use crate::config::SyncConfig;
use serde_json::Value;
use std::future::Future;

tokio::task_local! {
    static CURRENT: SyncContext;
}

/// Activation state plus optional rendering context for one unit of work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncContext {
    enabled: bool,
    render_context: Option<Value>,
}

impl SyncContext {
    /// An active context with no rendering context.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            render_context: None,
        }
    }

    /// An inactive context. Nothing is captured, diffed, or published.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A context whose activation follows `config.enabled_by_default`.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            enabled: config.enabled_by_default,
            render_context: None,
        }
    }

    /// Attaches a rendering context (e.g. the requesting user's view state).
    pub fn with_render_context(mut self, render_context: Value) -> Self {
        self.render_context = Some(render_context);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn render_context(&self) -> Option<&Value> {
        self.render_context.as_ref()
    }
}

/// Runs `future` with `ctx` as the task-local context.
pub async fn scope<F>(ctx: SyncContext, future: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, future).await
}

/// Runs `f` synchronously with `ctx` as the task-local context.
pub fn sync_scope<F, R>(ctx: SyncContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT.sync_scope(ctx, f)
}

/// The task-local context, or a disabled one outside any [`scope`].
pub fn current() -> SyncContext {
    CURRENT
        .try_with(Clone::clone)
        .unwrap_or_else(|_| SyncContext::disabled())
}

/// Shorthand for `current().is_enabled()`.
pub fn is_enabled() -> bool {
    CURRENT.try_with(SyncContext::is_enabled).unwrap_or(false)
}
