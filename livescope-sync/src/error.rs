//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Only declaration and binding errors reach callers at runtime. An argument
/// that cannot be resolved against a record is not an error: it marks the
/// scope's filter invalid instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A scope name collides with a declared scope or a field of its owner type.
    #[error("scope name `{name}` is already defined on `{entity_type}`")]
    DuplicateScopeName { entity_type: String, name: String },

    /// The entity type was never registered.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// No scope with this name is declared on the entity type.
    #[error("unknown scope `{name}` on `{entity_type}`")]
    UnknownScope { entity_type: String, name: String },

    /// A scope parameter is not an attribute or relation of the owner type,
    /// or the predicate references a parameter that was not declared.
    #[error("scope `{scope}` has unknown parameter `{param}`")]
    UnknownParameter { scope: String, param: String },

    /// A predicate reads a field the owner type does not declare.
    #[error("scope `{scope}` reads unknown field `{field}`")]
    UnknownField { scope: String, field: String },

    /// Explicit binding was given the wrong number of arguments.
    #[error("scope `{scope}` expects {expected} arguments, got {got}")]
    ArgumentCount {
        scope: String,
        expected: usize,
        got: usize,
    },

    /// An explicit argument does not match its parameter's kind: a relation
    /// takes a record of its target type, an attribute takes a value.
    #[error("scope `{scope}` parameter `{param}` cannot bind {got}")]
    ArgumentKind {
        scope: String,
        param: String,
        got: String,
    },

    /// Entity store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Delivery to a transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,
}
