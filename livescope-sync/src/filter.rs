//! Scope predicates.
//!
//! A predicate is a small expression tree over an entity's attributes, never
//! executable code. Operands are either literals or named scope parameters;
//! binding the parameters turns a [`FilterExpr`] into a [`Filter`].

use crate::channel::ChannelId;
use livescope_model::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// A scope parameter, bound per instance.
    Param(String),
    /// A fixed value.
    Literal(Value),
}

impl Operand {
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }
}

/// A predicate over the attributes of one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FilterExpr {
    /// Matches every entity of the owner type.
    All,
    Eq {
        field: String,
        value: Operand,
    },
    Ne {
        field: String,
        value: Operand,
    },
    /// Set membership. An operand bound to an array contributes its elements.
    In {
        field: String,
        values: Vec<Operand>,
    },
    /// Inclusive range over numbers or strings. Missing bounds are open.
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<Operand>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<Operand>,
    },
    And {
        all: Vec<FilterExpr>,
    },
    Or {
        any: Vec<FilterExpr>,
    },
    Not {
        expr: Box<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn eq(field: impl Into<String>, value: Operand) -> Self {
        Self::Eq {
            field: field.into(),
            value,
        }
    }

    pub fn ne(field: impl Into<String>, value: Operand) -> Self {
        Self::Ne {
            field: field.into(),
            value,
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Operand>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    pub fn range(field: impl Into<String>, min: Option<Operand>, max: Option<Operand>) -> Self {
        Self::Range {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn and(all: Vec<FilterExpr>) -> Self {
        Self::And { all }
    }

    pub fn or(any: Vec<FilterExpr>) -> Self {
        Self::Or { any }
    }

    pub fn not(expr: FilterExpr) -> Self {
        Self::Not {
            expr: Box::new(expr),
        }
    }

    /// Parameter names referenced by the expression, in order of first use.
    pub fn params(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut Vec<&'a str>) {
        let mut push = |op: &'a Operand| {
            if let Operand::Param(name) = op
                && !out.contains(&name.as_str())
            {
                out.push(name.as_str());
            }
        };
        match self {
            Self::All => {}
            Self::Eq { value, .. } | Self::Ne { value, .. } => push(value),
            Self::In { values, .. } => values.iter().for_each(push),
            Self::Range { min, max, .. } => {
                min.iter().chain(max.iter()).for_each(push);
            }
            Self::And { all: exprs } | Self::Or { any: exprs } => {
                for expr in exprs {
                    expr.collect_params(out);
                }
            }
            Self::Not { expr } => expr.collect_params(out),
        }
    }

    /// Fields (attribute names) the expression reads.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::All => {}
            Self::Eq { field, .. }
            | Self::Ne { field, .. }
            | Self::In { field, .. }
            | Self::Range { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            Self::And { all: exprs } | Self::Or { any: exprs } => {
                for expr in exprs {
                    expr.collect_fields(out);
                }
            }
            Self::Not { expr } => expr.collect_fields(out),
        }
    }

    /// Evaluates the expression. `lookup` yields bound parameter values; an
    /// unbound parameter makes the comparison that uses it false.
    pub fn evaluate<'v>(&self, entity: &Entity, lookup: &dyn Fn(&str) -> Option<&'v Value>) -> bool {
        let null = Value::Null;
        let attr = |field: &str| entity.attribute(field).unwrap_or(&null).clone();
        let operand = |op: &Operand| -> Option<Value> {
            match op {
                Operand::Literal(v) => Some(v.clone()),
                Operand::Param(name) => lookup(name).cloned(),
            }
        };

        match self {
            Self::All => true,
            Self::Eq { field, value } => {
                operand(value).is_some_and(|v| values_equal(&attr(field), &v))
            }
            Self::Ne { field, value } => {
                operand(value).is_some_and(|v| !values_equal(&attr(field), &v))
            }
            Self::In { field, values } => {
                let actual = attr(field);
                values.iter().filter_map(operand).any(|v| match v {
                    Value::Array(items) => items.iter().any(|i| values_equal(&actual, i)),
                    v => values_equal(&actual, &v),
                })
            }
            Self::Range { field, min, max } => {
                let actual = attr(field);
                let lower = match min {
                    Some(op) => operand(op).is_some_and(|v| {
                        matches!(
                            compare(&actual, &v),
                            Some(Ordering::Greater | Ordering::Equal)
                        )
                    }),
                    None => true,
                };
                let upper = match max {
                    Some(op) => operand(op).is_some_and(|v| {
                        matches!(compare(&actual, &v), Some(Ordering::Less | Ordering::Equal))
                    }),
                    None => true,
                };
                lower && upper && !actual.is_null()
            }
            Self::And { all } => all.iter().all(|e| e.evaluate(entity, lookup)),
            Self::Or { any } => any.iter().any(|e| e.evaluate(entity, lookup)),
            Self::Not { expr } => !expr.evaluate(entity, lookup),
        }
    }
}

/// JSON equality that treats `1` and `1.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// A predicate bound to concrete arguments.
///
/// A filter is invalid when any argument failed to resolve; an invalid filter
/// contains nothing and must not drive any notification.
#[derive(Debug, Clone)]
pub struct Filter {
    owner_type: String,
    predicate: Arc<FilterExpr>,
    bindings: Option<Vec<(String, Value)>>,
    channel: ChannelId,
}

impl Filter {
    /// Binds `predicate`. `bindings` is `None` when some argument was unresolved.
    pub(crate) fn new(
        owner_type: &str,
        predicate: Arc<FilterExpr>,
        bindings: Option<Vec<(String, Value)>>,
        channel: ChannelId,
    ) -> Self {
        Self {
            owner_type: owner_type.to_string(),
            predicate,
            bindings,
            channel,
        }
    }

    /// Membership test. Always false for invalid filters and for entities of
    /// another type.
    pub fn contains(&self, entity: &Entity) -> bool {
        let Some(bindings) = &self.bindings else {
            return false;
        };
        if entity.entity_type != self.owner_type {
            return false;
        }
        let lookup = |name: &str| bindings.iter().find(|(n, _)| n == name).map(|(_, v)| v);
        self.predicate.evaluate(entity, &lookup)
    }

    /// False if any bound argument failed to resolve.
    pub fn is_valid(&self) -> bool {
        self.bindings.is_some()
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel
    }

    pub fn predicate(&self) -> &FilterExpr {
        &self.predicate
    }
}
