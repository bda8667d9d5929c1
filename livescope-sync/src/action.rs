//! Actions and the per-unit-of-work action queue.

use crate::channel::ChannelId;
use crate::scope::ScopeInstance;
use livescope_model::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What happened to a record, from a channel's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    New,
    Update,
    Destroy,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("new"),
            Self::Update => f.write_str("update"),
            Self::Destroy => f.write_str("destroy"),
        }
    }
}

/// The record a fragment is rendered for.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTarget {
    Record(Entity),
    /// A record shown within its default-scope parent.
    Nested { record: Entity, parent: Entity },
}

impl ActionTarget {
    /// The record the action is about.
    pub fn record(&self) -> &Entity {
        match self {
            Self::Record(record) | Self::Nested { record, .. } => record,
        }
    }

    pub fn parent(&self) -> Option<&Entity> {
        match self {
            Self::Record(_) => None,
            Self::Nested { parent, .. } => Some(parent),
        }
    }
}

/// Which channel an action is delivered on.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionScope {
    /// The record's own channel, or its type's collection channel for `new`.
    Primary,
    /// The collection nested under a default-scope parent.
    Parent(Entity),
    /// A declared scope.
    Named(ScopeInstance),
}

/// One notification for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub target: ActionTarget,
    pub kind: ActionKind,
    pub scope: ActionScope,
    /// The default-scope parent, when the owner type has one and it resolved.
    pub default_scope: Option<Entity>,
}

impl Action {
    pub fn new(target: ActionTarget, kind: ActionKind, scope: ActionScope) -> Self {
        Self {
            target,
            kind,
            scope,
            default_scope: None,
        }
    }

    pub fn with_default_scope(mut self, default_scope: Option<Entity>) -> Self {
        self.default_scope = default_scope;
        self
    }

    pub fn record(&self) -> &Entity {
        self.target.record()
    }

    /// The channel this action is published on.
    pub fn channel_id(&self) -> ChannelId {
        match &self.scope {
            ActionScope::Named(scope) => scope.channel_id().clone(),
            ActionScope::Parent(parent) => ChannelId::nested(parent, &self.record().entity_type),
            ActionScope::Primary => match self.kind {
                ActionKind::New => ChannelId::collection(&self.record().entity_type),
                ActionKind::Update | ActionKind::Destroy => ChannelId::record(self.record()),
            },
        }
    }

    /// The declared scope, if this action targets one.
    pub fn named_scope(&self) -> Option<&ScopeInstance> {
        match &self.scope {
            ActionScope::Named(scope) => Some(scope),
            _ => None,
        }
    }

    /// Wire form handed to transports and subscribers.
    pub fn to_message(&self, render_context: Option<&Value>) -> ActionMessage {
        ActionMessage {
            channel: self.channel_id(),
            kind: self.kind,
            record: self.record().clone(),
            parent: self.target.parent().cloned(),
            default_scope: self.default_scope.clone(),
            render_context: render_context.cloned(),
        }
    }
}

/// Serializable form of an [`Action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub channel: ChannelId,
    pub kind: ActionKind,
    pub record: Entity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_context: Option<Value>,
}

/// Actions accumulated during one unit of work, in emission order.
#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: Vec<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Takes every queued action, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }
}
