//! Sync engine: lifecycle entry points for one unit of work.
//!
//! The host calls the engine from its mutation lifecycle:
//!
//! 1. [`SyncEngine::begin`] when the unit of work starts
//! 2. [`SyncEngine::before_update`] before an update is applied
//! 3. [`SyncEngine::after_create`] / [`SyncEngine::after_update`] /
//!    [`SyncEngine::after_destroy`] once the store has applied the mutation
//! 4. [`SyncEngine::commit`] after the enclosing transaction committed, or
//!    [`UnitOfWork::rollback`] (or a plain drop) when it aborted
//!
//! Every step is a no-op when the unit of work's context is disabled.

use crate::action::{Action, ActionQueue};
use crate::context::{self, SyncContext};
use crate::diff;
use crate::registry::ScopeRegistry;
use crate::resolver;
use crate::scope;
use crate::snapshot::SyncSnapshot;
use crate::store::EntityLookup;
use crate::transport::{ActionPublisher, PublishReport};
use livescope_model::{Entity, TrackedEntity};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Actions collected for one mutating operation and its commit boundary.
///
/// The queue is published at most once, by [`SyncEngine::commit`]. Dropping a
/// unit of work without committing discards its actions.
#[derive(Debug)]
pub struct UnitOfWork {
    id: Uuid,
    context: SyncContext,
    queue: ActionQueue,
}

impl UnitOfWork {
    fn new(context: SyncContext) -> Self {
        Self {
            id: Uuid::now_v7(),
            context,
            queue: ActionQueue::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub fn is_enabled(&self) -> bool {
        self.context.is_enabled()
    }

    /// Actions queued so far.
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Discards every queued action.
    pub fn rollback(mut self) {
        let dropped = self.queue.drain().len();
        debug!("[uow {}] Rolled back, discarded {dropped} actions", self.id);
    }

    fn enqueue(&mut self, actions: Vec<Action>) {
        for action in actions {
            debug!(
                "[uow {}] Queued {} for {}#{} on {}",
                self.id,
                action.kind,
                action.record().entity_type,
                action.record().id,
                action.channel_id()
            );
            self.queue.push(action);
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.queue.is_empty() {
            debug!(
                "[uow {}] Dropped without commit, discarding {} actions",
                self.id,
                self.queue.len()
            );
        }
    }
}

/// Classifies mutations against the scope registry and publishes the result.
pub struct SyncEngine {
    registry: Arc<ScopeRegistry>,
    store: Arc<dyn EntityLookup>,
    publisher: Arc<dyn ActionPublisher>,
}

impl SyncEngine {
    pub fn new(
        registry: Arc<ScopeRegistry>,
        store: Arc<dyn EntityLookup>,
        publisher: Arc<dyn ActionPublisher>,
    ) -> Self {
        Self {
            registry,
            store,
            publisher,
        }
    }

    pub fn registry(&self) -> &Arc<ScopeRegistry> {
        &self.registry
    }

    /// Starts a unit of work under `ctx`.
    pub fn begin(&self, ctx: &SyncContext) -> UnitOfWork {
        UnitOfWork::new(ctx.clone())
    }

    /// Starts a unit of work under the task-local context.
    pub fn begin_current(&self) -> UnitOfWork {
        UnitOfWork::new(context::current())
    }

    /// Captures the before-state of an update. Returns `None` when syncing is
    /// disabled or the entity type is not registered.
    pub fn before_update(&self, uow: &UnitOfWork, tracked: &TrackedEntity) -> Option<SyncSnapshot> {
        if !uow.is_enabled() {
            return None;
        }
        let entity_type = &tracked.entity().entity_type;
        let registration = self.registry.registration(entity_type)?;
        debug!(
            "[uow {}] Capturing {} scopes for {}#{}",
            uow.id,
            registration.scopes().len(),
            entity_type,
            tracked.entity().id
        );
        Some(SyncSnapshot::capture(
            tracked,
            registration.scopes(),
            self.store.as_ref(),
        ))
    }

    /// Queues the actions for a created entity.
    pub fn after_create(&self, uow: &mut UnitOfWork, entity: &Entity) {
        if !uow.is_enabled() || !self.registry.is_registered(&entity.entity_type) {
            return;
        }
        let default_scope = self.default_scope_of(entity);
        let scopes = self.derive_scopes(entity);
        uow.enqueue(diff::creation_actions(entity, default_scope.as_ref(), scopes));
    }

    /// Queues the actions for an updated entity. `snapshot` is what
    /// [`before_update`](Self::before_update) returned for the same update.
    pub fn after_update(&self, uow: &mut UnitOfWork, snapshot: Option<SyncSnapshot>, entity: &Entity) {
        if !uow.is_enabled() {
            return;
        }
        let Some(snapshot) = snapshot else {
            debug!(
                "[uow {}] No snapshot for {}#{}, skipping",
                uow.id, entity.entity_type, entity.id
            );
            return;
        };

        let default_scope = self.default_scope_of(entity);
        let mut actions = vec![diff::primary_update_action(
            &snapshot,
            entity,
            default_scope.as_ref(),
        )];

        let record_before = snapshot.record_before_update();
        for before in snapshot.scopes() {
            let scope_after_update =
                scope::derive(before.scope_before_update.definition(), entity, self.store.as_ref());
            actions.extend(diff::scope_update_actions(
                before,
                &scope_after_update,
                record_before,
                entity,
                default_scope.as_ref(),
            ));
        }
        uow.enqueue(actions);
    }

    /// Queues the actions for a destroyed entity.
    pub fn after_destroy(&self, uow: &mut UnitOfWork, entity: &Entity) {
        if !uow.is_enabled() || !self.registry.is_registered(&entity.entity_type) {
            return;
        }
        let default_scope = self.default_scope_of(entity);
        let scopes = self.derive_scopes(entity);
        uow.enqueue(diff::destruction_actions(entity, default_scope.as_ref(), scopes));
    }

    /// Publishes every queued action, in order, once the enclosing transaction
    /// has committed. A failed delivery is logged and does not stop the rest.
    pub async fn commit(&self, mut uow: UnitOfWork) -> PublishReport {
        let mut report = PublishReport::default();
        if !uow.is_enabled() {
            return report;
        }

        let actions = uow.queue.drain();
        let render_context = uow.context.render_context();
        for action in &actions {
            let channel = action.channel_id();
            match self.publisher.publish(&channel, action, render_context).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("[uow {}] Failed to publish {} on {channel}: {e}", uow.id, action.kind);
                    report.failed += 1;
                }
            }
        }

        info!(
            "[uow {}] Published {} actions ({} failed)",
            uow.id, report.delivered, report.failed
        );
        report
    }

    fn derive_scopes(&self, entity: &Entity) -> Vec<scope::ScopeInstance> {
        self.registry
            .scopes(&entity.entity_type)
            .iter()
            .map(|definition| scope::derive(definition, entity, self.store.as_ref()))
            .collect()
    }

    /// The entity's default-scope parent, freshly loaded from the store.
    fn default_scope_of(&self, entity: &Entity) -> Option<Entity> {
        let default = self.registry.default_scope(&entity.entity_type)?;
        resolver::related(entity, &default.relation, &default.target_type, self.store.as_ref())
    }
}
