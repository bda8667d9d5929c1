//! Scope-membership diffing and action fan-out for livescope.
//!
//! When a persistent entity is created, updated, or destroyed, subscribers
//! watching named, parameterized scopes of that entity type need to learn
//! whether the entity entered, changed within, or left their scope. This
//! crate works that out from before/after snapshots of the one entity, without
//! re-querying any scope's result set.
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Registry**: per-type scope declarations, checked against the schema
//! - **Filter**: tagged predicate expressions bound to scope arguments
//! - **Resolver**: reads scope arguments from attributes or related records
//! - **Snapshot**: before-state of an update, per declared scope
//! - **Diff**: classifies each transition into `new` / `update` / `destroy`
//! - **Engine**: runs one unit of work and publishes after commit
//! - **Context**: whether syncing is active, plus the rendering context
//!
//! ## Update Process
//!
//! 1. **Capture**: before the update, derive every scope from the
//!    pre-mutation record and record its membership
//! 2. **Mutate**: the host's store applies the change
//! 3. **Diff**: derive every scope again from the updated record and compare
//!    membership across the before and after instances
//! 4. **Commit**: publish the queued actions once, in order
//!
//! # Example
//!
//! ```
//! use livescope_model::{EntitySchema, IndexedField};
//! use livescope_sync::{FilterExpr, Operand, ScopeArg, ScopeRegistry};
//!
//! let mut builder = ScopeRegistry::builder();
//! builder
//!     .register_type(EntitySchema::new("todo", vec![IndexedField::text("/status")]))
//!     .unwrap()
//!     .declare_scope("todo", "open", &[], FilterExpr::eq("status", Operand::literal("open")))
//!     .unwrap();
//! let registry = builder.build();
//!
//! let open = registry.bind_scope("todo", "open", Vec::<ScopeArg>::new()).unwrap();
//! assert_eq!(open.channel_id().as_str(), "todo:open");
//! ```

pub mod action;
pub mod channel;
pub mod config;
pub mod context;
pub mod diff;
mod engine;
mod error;
pub mod filter;
pub mod hub;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod snapshot;
pub mod store;
pub mod transport;

pub use action::{Action, ActionKind, ActionMessage, ActionQueue, ActionScope, ActionTarget};
pub use channel::ChannelId;
pub use config::SyncConfig;
pub use context::SyncContext;
pub use diff::ScopeTransition;
pub use engine::{SyncEngine, UnitOfWork};
pub use error::{SyncError, SyncResult};
pub use filter::{Filter, FilterExpr, Operand};
pub use hub::{Subscription, SubscriptionHub};
pub use registry::{
    DefaultScope, RegistryManifest, ScopeManifest, ScopeRegistry, ScopeRegistryBuilder,
    TypeManifest, TypeRegistration,
};
pub use scope::{ParamKind, ScopeArg, ScopeDefinition, ScopeInstance, ScopeParam};
pub use snapshot::{ScopeSnapshot, SyncSnapshot};
pub use store::{EntityLookup, MemoryStore};
pub use transport::{ActionPublisher, PublishReport};
