//! Per-entity-type scope registry.
//!
//! Scopes are declared once at startup through [`ScopeRegistryBuilder`], which
//! checks every declaration against the owner's [`EntitySchema`]. `build()`
//! freezes the result into a [`ScopeRegistry`] that is read-only from then on
//! and shared between the engine and subscribers.

use crate::error::{SyncError, SyncResult};
use crate::filter::FilterExpr;
use crate::scope::{self, ParamKind, ScopeArg, ScopeDefinition, ScopeInstance, ScopeParam};
use crate::store::EntityLookup;
use livescope_model::{Entity, EntitySchema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The relation whose related record is an entity type's aggregate channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultScope {
    pub relation: String,
    pub target_type: String,
}

/// Everything registered for one entity type.
#[derive(Debug, Clone)]
pub struct TypeRegistration {
    schema: EntitySchema,
    default_scope: Option<DefaultScope>,
    scopes: Vec<Arc<ScopeDefinition>>,
}

impl TypeRegistration {
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn default_scope(&self) -> Option<&DefaultScope> {
        self.default_scope.as_ref()
    }

    /// Declared scopes in declaration order.
    pub fn scopes(&self) -> &[Arc<ScopeDefinition>] {
        &self.scopes
    }

    fn scope(&self, name: &str) -> Option<&Arc<ScopeDefinition>> {
        self.scopes.iter().find(|s| s.name() == name)
    }
}

/// Serialized form of a registry, for loading declarations from config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    pub types: Vec<TypeManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeManifest {
    pub schema: EntitySchema,
    /// Relation name of the default scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<String>,
    #[serde(default)]
    pub scopes: Vec<ScopeManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeManifest {
    pub name: String,
    /// Parameter names. When omitted, taken from the predicate in order of use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    pub predicate: FilterExpr,
}

/// Collects type registrations and scope declarations.
#[derive(Debug, Default)]
pub struct ScopeRegistryBuilder {
    types: HashMap<String, TypeRegistration>,
}

impl ScopeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type. Each type may be registered once.
    pub fn register_type(&mut self, schema: EntitySchema) -> SyncResult<&mut Self> {
        if self.types.contains_key(&schema.entity_type) {
            return Err(SyncError::Config(format!(
                "entity type `{}` is already registered",
                schema.entity_type
            )));
        }
        debug!("Registering entity type {}", schema.entity_type);
        self.types.insert(
            schema.entity_type.clone(),
            TypeRegistration {
                schema,
                default_scope: None,
                scopes: Vec::new(),
            },
        );
        Ok(self)
    }

    /// Makes `relation` the default scope of `entity_type`.
    pub fn default_scope(&mut self, entity_type: &str, relation: &str) -> SyncResult<&mut Self> {
        let registration = self.registration_mut(entity_type)?;
        let target_type = registration
            .schema
            .relation_target(relation)
            .ok_or_else(|| SyncError::UnknownParameter {
                scope: "default".into(),
                param: relation.to_string(),
            })?
            .to_string();
        registration.default_scope = Some(DefaultScope {
            relation: relation.to_string(),
            target_type,
        });
        Ok(self)
    }

    /// Declares scope `name` on `entity_type`.
    ///
    /// Every parameter must be an attribute or relation of the owner schema;
    /// its resolution kind is fixed here. The predicate may only reference
    /// declared parameters and schema fields. The name must not collide with
    /// another scope or a field of the owner type.
    pub fn declare_scope(
        &mut self,
        entity_type: &str,
        name: &str,
        params: &[&str],
        predicate: FilterExpr,
    ) -> SyncResult<&mut Self> {
        let registration = self.registration_mut(entity_type)?;
        let schema = &registration.schema;

        if registration.scope(name).is_some() || schema.has_field(name) {
            return Err(SyncError::DuplicateScopeName {
                entity_type: entity_type.to_string(),
                name: name.to_string(),
            });
        }

        let mut declared = Vec::with_capacity(params.len());
        for &param in params {
            let kind = match schema.relation_target(param) {
                Some(target_type) => ParamKind::Relation {
                    target_type: target_type.to_string(),
                },
                None if schema.has_field(param) => ParamKind::Attribute,
                None => {
                    return Err(SyncError::UnknownParameter {
                        scope: name.to_string(),
                        param: param.to_string(),
                    });
                }
            };
            declared.push(ScopeParam {
                name: param.to_string(),
                kind,
            });
        }

        if let Some(param) = predicate.params().into_iter().find(|p| !params.contains(p)) {
            return Err(SyncError::UnknownParameter {
                scope: name.to_string(),
                param: param.to_string(),
            });
        }
        if let Some(field) = predicate.fields().into_iter().find(|f| !schema.has_field(f)) {
            return Err(SyncError::UnknownField {
                scope: name.to_string(),
                field: field.to_string(),
            });
        }

        debug!("Declaring scope {entity_type}:{name} with params {params:?}");
        let definition = ScopeDefinition::new(entity_type, name, declared, predicate);
        registration.scopes.push(Arc::new(definition));
        Ok(self)
    }

    /// Declares a scope whose parameters are the predicate's own parameters,
    /// in order of first use.
    pub fn declare_scope_from_predicate(
        &mut self,
        entity_type: &str,
        name: &str,
        predicate: FilterExpr,
    ) -> SyncResult<&mut Self> {
        let params: Vec<String> = predicate.params().into_iter().map(String::from).collect();
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        self.declare_scope(entity_type, name, &params, predicate)
    }

    /// Applies every registration in a JSON [`RegistryManifest`].
    pub fn load_manifest(&mut self, json: &str) -> SyncResult<&mut Self> {
        let manifest: RegistryManifest = serde_json::from_str(json)?;
        for entry in manifest.types {
            let entity_type = entry.schema.entity_type.clone();
            self.register_type(entry.schema)?;
            if let Some(relation) = &entry.default_scope {
                self.default_scope(&entity_type, relation)?;
            }
            for decl in entry.scopes {
                match &decl.params {
                    Some(params) => {
                        let params: Vec<&str> = params.iter().map(String::as_str).collect();
                        self.declare_scope(&entity_type, &decl.name, &params, decl.predicate)?;
                    }
                    None => {
                        self.declare_scope_from_predicate(&entity_type, &decl.name, decl.predicate)?;
                    }
                }
            }
        }
        Ok(self)
    }

    /// Freezes the registry.
    pub fn build(self) -> ScopeRegistry {
        ScopeRegistry { types: self.types }
    }

    fn registration_mut(&mut self, entity_type: &str) -> SyncResult<&mut TypeRegistration> {
        self.types
            .get_mut(entity_type)
            .ok_or_else(|| SyncError::UnknownEntityType(entity_type.to_string()))
    }
}

/// Read-only map from entity type to its registration.
#[derive(Debug, Clone, Default)]
pub struct ScopeRegistry {
    types: HashMap<String, TypeRegistration>,
}

impl ScopeRegistry {
    pub fn builder() -> ScopeRegistryBuilder {
        ScopeRegistryBuilder::new()
    }

    pub fn registration(&self, entity_type: &str) -> Option<&TypeRegistration> {
        self.types.get(entity_type)
    }

    pub fn is_registered(&self, entity_type: &str) -> bool {
        self.types.contains_key(entity_type)
    }

    /// Declared scopes of `entity_type`; empty when the type is unknown.
    pub fn scopes(&self, entity_type: &str) -> &[Arc<ScopeDefinition>] {
        self.types
            .get(entity_type)
            .map(TypeRegistration::scopes)
            .unwrap_or(&[])
    }

    pub fn default_scope(&self, entity_type: &str) -> Option<&DefaultScope> {
        self.types.get(entity_type).and_then(TypeRegistration::default_scope)
    }

    /// Looks up a declared scope.
    pub fn definition(&self, entity_type: &str, name: &str) -> SyncResult<&Arc<ScopeDefinition>> {
        let registration = self
            .types
            .get(entity_type)
            .ok_or_else(|| SyncError::UnknownEntityType(entity_type.to_string()))?;
        registration.scope(name).ok_or_else(|| SyncError::UnknownScope {
            entity_type: entity_type.to_string(),
            name: name.to_string(),
        })
    }

    /// Subscriber-side construction: binds scope `name` to explicit arguments.
    pub fn bind_scope(
        &self,
        entity_type: &str,
        name: &str,
        args: Vec<ScopeArg>,
    ) -> SyncResult<ScopeInstance> {
        scope::bind(self.definition(entity_type, name)?, args)
    }

    /// Publisher-side construction: derives scope `name` from `entity`.
    pub fn derive_scope(
        &self,
        name: &str,
        entity: &Entity,
        store: &dyn EntityLookup,
    ) -> SyncResult<ScopeInstance> {
        let definition = self.definition(&entity.entity_type, name)?;
        Ok(scope::derive(definition, entity, store))
    }
}
