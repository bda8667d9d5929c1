use serde::{Deserialize, Serialize};

/// Describes an entity type's attributes and relations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    pub entity_type: String,
    pub fields: Vec<IndexedField>,
}

impl EntitySchema {
    pub fn new(entity_type: impl Into<String>, fields: Vec<IndexedField>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields,
        }
    }

    /// Looks up a field by attribute name (`"status"`, not `"/status"`).
    pub fn field(&self, name: &str) -> Option<&IndexedField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Whether `name` is an attribute or relation of this type.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the related entity type if `name` is a relation field.
    pub fn relation_target(&self, name: &str) -> Option<&str> {
        self.field(name)
            .filter(|f| f.field_type == FieldType::Relation)
            .and_then(|f| f.target_type.as_deref())
    }

    /// Names of every declared field, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(IndexedField::name)
    }
}

/// A top-level field of an entity's `data` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedField {
    /// JSON pointer path (e.g., "/title", "/project").
    pub field_path: String,
    pub field_type: FieldType,
    /// Related entity type. Only meaningful when FieldType is Relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
}

impl IndexedField {
    fn simple(path: &str, field_type: FieldType) -> Self {
        Self {
            field_path: path.into(),
            field_type,
            target_type: None,
        }
    }

    /// The attribute name this field addresses: the path without its leading `/`.
    pub fn name(&self) -> &str {
        self.field_path.strip_prefix('/').unwrap_or(&self.field_path)
    }

    /// Shorthand for a text field.
    pub fn text(path: &str) -> Self {
        Self::simple(path, FieldType::Text)
    }

    /// Shorthand for a tag array field.
    pub fn tag(path: &str) -> Self {
        Self::simple(path, FieldType::Tag)
    }

    /// Shorthand for a DateTime field.
    pub fn datetime(path: &str) -> Self {
        Self::simple(path, FieldType::DateTime)
    }

    /// Shorthand for a numeric field.
    pub fn number(path: &str) -> Self {
        Self::simple(path, FieldType::Number)
    }

    /// Shorthand for a boolean field.
    pub fn bool(path: &str) -> Self {
        Self::simple(path, FieldType::Bool)
    }

    /// Shorthand for a JSON blob field.
    pub fn json(path: &str) -> Self {
        Self::simple(path, FieldType::Json)
    }

    /// Shorthand for a relation to an entity of `target_type`.
    pub fn relation(path: &str, target_type: &str) -> Self {
        Self {
            field_path: path.into(),
            field_type: FieldType::Relation,
            target_type: Some(target_type.into()),
        }
    }
}

/// The data type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Tag,
    DateTime,
    Number,
    Bool,
    Relation,
    Json,
}
