//! Scope definitions and bound scope instances.

use crate::channel::{self, ChannelId};
use crate::filter::{Filter, FilterExpr};
use crate::error::{SyncError, SyncResult};
use crate::resolver;
use crate::store::EntityLookup;
use livescope_model::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// How a scope parameter is read from a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamKind {
    /// A direct attribute value.
    Attribute,
    /// The related record named by the attribute's id.
    Relation { target_type: String },
}

/// One declared scope parameter, resolved against the owner schema at
/// declaration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeParam {
    pub name: String,
    pub kind: ParamKind,
}

/// A bound scope argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeArg {
    /// An attribute value.
    Value(Value),
    /// A related record, identified by type and id.
    Record { entity_type: String, id: String },
}

impl ScopeArg {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn record(entity: &Entity) -> Self {
        Self::Record {
            entity_type: entity.entity_type.clone(),
            id: entity.id.clone(),
        }
    }

    /// The value predicates compare against. A record compares as its id,
    /// which is what the owner's relation attribute stores.
    pub fn comparable(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Record { id, .. } => Value::String(id.clone()),
        }
    }

    /// Whether this argument can bind a parameter of `kind`: attributes take
    /// values, relations take records of their target type.
    pub fn fits(&self, kind: &ParamKind) -> bool {
        match (self, kind) {
            (Self::Value(_), ParamKind::Attribute) => true,
            (Self::Record { entity_type, .. }, ParamKind::Relation { target_type }) => {
                entity_type == target_type
            }
            _ => false,
        }
    }

    /// Deterministic text form used in channel identities. Arguments that
    /// compare equal in a predicate render identically.
    pub fn canonical(&self) -> String {
        match self {
            Self::Value(v) => channel::value_key(v),
            Self::Record { entity_type, id } => channel::record_key(entity_type, id),
        }
    }
}

/// A named, parameterized predicate declared on an entity type.
#[derive(Debug)]
pub struct ScopeDefinition {
    owner_type: String,
    name: String,
    params: Vec<ScopeParam>,
    predicate: Arc<FilterExpr>,
}

impl ScopeDefinition {
    pub(crate) fn new(
        owner_type: &str,
        name: &str,
        params: Vec<ScopeParam>,
        predicate: FilterExpr,
    ) -> Self {
        Self {
            owner_type: owner_type.to_string(),
            name: name.to_string(),
            params,
            predicate: Arc::new(predicate),
        }
    }

    pub fn owner_type(&self) -> &str {
        &self.owner_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ScopeParam] {
        &self.params
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn predicate(&self) -> &FilterExpr {
        &self.predicate
    }
}

/// Binds a definition to explicit arguments (subscriber side).
pub fn bind(definition: &Arc<ScopeDefinition>, args: Vec<ScopeArg>) -> SyncResult<ScopeInstance> {
    if args.len() != definition.params.len() {
        return Err(SyncError::ArgumentCount {
            scope: definition.name.clone(),
            expected: definition.params.len(),
            got: args.len(),
        });
    }
    if let Some((param, arg)) = definition
        .params
        .iter()
        .zip(&args)
        .find(|(param, arg)| !arg.fits(&param.kind))
    {
        return Err(SyncError::ArgumentKind {
            scope: definition.name.clone(),
            param: param.name.clone(),
            got: arg.canonical(),
        });
    }
    Ok(ScopeInstance::new(
        Arc::clone(definition),
        args.into_iter().map(Some).collect(),
    ))
}

/// Derives an instance by resolving every parameter against `entity`
/// (publisher side). Unresolvable parameters leave the filter invalid.
pub fn derive(
    definition: &Arc<ScopeDefinition>,
    entity: &Entity,
    store: &dyn EntityLookup,
) -> ScopeInstance {
    let args = definition
        .params
        .iter()
        .map(|param| resolver::resolve(entity, param, store))
        .collect();
    ScopeInstance::new(Arc::clone(definition), args)
}

/// A scope definition bound to concrete arguments.
#[derive(Clone)]
pub struct ScopeInstance {
    definition: Arc<ScopeDefinition>,
    args: Vec<Option<ScopeArg>>,
    filter: Filter,
}

impl ScopeInstance {
    fn new(definition: Arc<ScopeDefinition>, args: Vec<Option<ScopeArg>>) -> Self {
        let channel = ChannelId::scope(&definition.owner_type, &definition.name, &args);
        let bindings = definition
            .params
            .iter()
            .zip(&args)
            .map(|(param, arg)| arg.as_ref().map(|a| (param.name.clone(), a.comparable())))
            .collect::<Option<Vec<_>>>();
        let filter = Filter::new(
            &definition.owner_type,
            Arc::clone(&definition.predicate),
            bindings,
            channel,
        );
        Self {
            definition,
            args,
            filter,
        }
    }

    pub fn definition(&self) -> &Arc<ScopeDefinition> {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Bound arguments in parameter order; `None` where resolution failed.
    pub fn args(&self) -> &[Option<ScopeArg>] {
        &self.args
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.filter.contains(entity)
    }

    pub fn is_valid(&self) -> bool {
        self.filter.is_valid()
    }

    pub fn channel_id(&self) -> &ChannelId {
        self.filter.channel_id()
    }
}

impl PartialEq for ScopeInstance {
    fn eq(&self, other: &Self) -> bool {
        self.channel_id() == other.channel_id()
    }
}

impl Eq for ScopeInstance {}

impl fmt::Debug for ScopeInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeInstance")
            .field("channel", self.channel_id())
            .field("valid", &self.is_valid())
            .finish()
    }
}
