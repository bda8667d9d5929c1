//! Channel identities.
//!
//! Every publish targets exactly one channel. Scope channels are derived from
//! the owner type, the scope name and the bound arguments, through the same
//! function whether the scope was bound by a subscriber or derived from a
//! record, so the two sides always agree.
//!
//! Entity types and ids are percent-encoded, so an id containing `:`, `/` or
//! `#` cannot alias another channel's segments. Attribute arguments render as
//! JSON text with numbers normalized: `1` and `1.0` share one channel, matching
//! how predicates compare them.

use crate::scope::ScopeArg;
use livescope_model::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable key subscribers use to receive one stream of actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Channel of a named scope bound to `args`. Unresolved arguments render as `?`.
    pub fn scope(owner_type: &str, name: &str, args: &[Option<ScopeArg>]) -> Self {
        let mut id = format!("{owner_type}:{name}");
        for arg in args {
            id.push(':');
            match arg {
                Some(arg) => id.push_str(&arg.canonical()),
                None => id.push('?'),
            }
        }
        Self(id)
    }

    /// A record's own channel.
    pub fn record(entity: &Entity) -> Self {
        Self::record_ref(&entity.entity_type, &entity.id)
    }

    pub fn record_ref(entity_type: &str, id: &str) -> Self {
        Self(record_key(entity_type, id))
    }

    /// Type-level collection channel, used for new records without a parent.
    pub fn collection(entity_type: &str) -> Self {
        Self(urlencoding::encode(entity_type).into_owned())
    }

    /// Collection of `entity_type` records nested under `parent`.
    pub fn nested(parent: &Entity, entity_type: &str) -> Self {
        Self(format!(
            "{}/{}",
            record_key(&parent.entity_type, &parent.id),
            urlencoding::encode(entity_type)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `type#id` with both parts percent-encoded.
pub(crate) fn record_key(entity_type: &str, id: &str) -> String {
    format!(
        "{}#{}",
        urlencoding::encode(entity_type),
        urlencoding::encode(id)
    )
}

/// JSON text of `value` with every number in one canonical form.
pub(crate) fn value_key(value: &Value) -> String {
    normalize(value).to_string()
}

// i64 covers every integral f64 below this bound exactly.
const INTEGRAL_LIMIT: f64 = 9.2e18;

fn normalize(value: &Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < INTEGRAL_LIMIT => Value::from(f as i64),
            Some(f) => Value::from(f),
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_render_by_value() {
        assert_eq!(value_key(&json!(1)), value_key(&json!(1.0)));
        assert_eq!(value_key(&json!(-3.0)), "-3");
        assert_eq!(value_key(&json!(2.5)), "2.5");
        assert_eq!(value_key(&json!([1.0, {"a": 2.0}])), "[1,{\"a\":2}]");
        assert_eq!(value_key(&json!("A")), "\"A\"");
    }

    #[test]
    fn record_segments_are_escaped() {
        assert_eq!(record_key("user", "u1"), "user#u1");
        assert_eq!(record_key("user", "a:b/c#d"), "user#a%3Ab%2Fc%23d");
        assert_ne!(
            ChannelId::record_ref("todo", "x/todo").as_str(),
            ChannelId::nested(&Entity::new("x", "todo", json!({})), "todo").as_str()
        );
    }
}
