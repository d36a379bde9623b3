//! Value types and conformance checks
//!
//! Field values are carried as `serde_json::Value`, with `Null` standing for
//! "unset". A [`ValueType`] decides which JSON shapes a field accepts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Declared type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "of")]
pub enum ValueType {
    Integer,
    /// Accepts integer literals as well (`lr: 1` is a valid float)
    Float,
    Boolean,
    String,
    /// A string restricted to the descriptor's choice set
    Choice,
    List(ElementType),
    Mapping,
}

/// Element type of a list-valued field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Any,
    Integer,
    Float,
    String,
}

impl ValueType {
    /// Whether a non-null value has the right shape for this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ValueType::Integer => is_integer(value),
            ValueType::Float => value.is_number(),
            ValueType::Boolean => value.is_boolean(),
            ValueType::String | ValueType::Choice => value.is_string(),
            ValueType::List(elem) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|item| elem.accepts(item))),
            ValueType::Mapping => value.is_object(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }
}

impl ElementType {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ElementType::Any => true,
            ElementType::Integer => is_integer(value),
            ElementType::Float => value.is_number(),
            ElementType::String => value.is_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Integer => write!(f, "integer"),
            ValueType::Float => write!(f, "float"),
            ValueType::Boolean => write!(f, "boolean"),
            ValueType::String => write!(f, "string"),
            ValueType::Choice => write!(f, "choice"),
            ValueType::List(ElementType::Any) => write!(f, "list"),
            ValueType::List(elem) => write!(f, "list<{elem}>"),
            ValueType::Mapping => write!(f, "mapping"),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Any => write!(f, "any"),
            ElementType::Integer => write!(f, "integer"),
            ElementType::Float => write!(f, "float"),
            ElementType::String => write!(f, "string"),
        }
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

/// Render a value for help text: strings unquoted, unset as `None`
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
