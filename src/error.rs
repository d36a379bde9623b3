//! Error types for neox-args

use crate::schema::{Mutability, ValueType};
use crate::validate::ValidationError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The schema itself is malformed (a bug in a group declaration)
    #[error("Schema error in group '{group}': {message}")]
    Schema { group: String, message: String },

    #[error("Unknown configuration key(s): {}", join(.unknown))]
    UnknownField { unknown: Vec<UnknownKey> },

    #[error("Unknown parameter group: {0}")]
    UnknownGroup(String),

    #[error("Duplicate field name(s) across groups: {}", join(.collisions))]
    DuplicateField { collisions: Vec<FieldCollision> },

    #[error("Invalid value(s): {}", join(.violations))]
    InvalidValue { violations: Vec<FieldViolation> },

    #[error("Field '{field}' is {mutability} and cannot be reassigned")]
    ImmutableField {
        field: String,
        mutability: Mutability,
    },

    #[error("Configuration failed validation with {} error(s):\n  {}", .0.len(), join_lines(.0))]
    Validation(Vec<ValidationError>),

    #[error("Key '{key}' is set by more than one source: {}", .sources.join(", "))]
    ConfigConflict { key: String, sources: Vec<String> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A key that matched no declared field
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownKey {
    /// Group the key was addressed to, or `None` for the flat mapping
    pub group: Option<String>,
    pub key: String,
    /// Closest declared field name, if any is near enough
    pub suggestion: Option<String>,
}

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "'{}' (group '{}')", self.key, group)?,
            None => write!(f, "'{}'", self.key)?,
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

/// A field name declared by more than one group
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCollision {
    pub field: String,
    pub groups: Vec<String>,
}

impl fmt::Display for FieldCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' declared by groups [{}]", self.field, self.groups.join(", "))
    }
}

/// What a field would have accepted
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Type(ValueType),
    OneOf(Vec<String>),
    Range { min: Option<f64>, max: Option<f64> },
    NotNull,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Type(ty) => write!(f, "a value of type {ty}"),
            Expected::OneOf(choices) => write!(f, "one of {{{}}}", choices.join(", ")),
            Expected::Range { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => write!(f, "a value in [{lo}, {hi}]"),
                (Some(lo), None) => write!(f, "a value >= {lo}"),
                (None, Some(hi)) => write!(f, "a value <= {hi}"),
                (None, None) => write!(f, "any value"),
            },
            Expected::NotNull => write!(f, "a concrete value (field has a non-null default)"),
        }
    }
}

/// A single per-field type/choice/range failure
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub group: String,
    pub field: String,
    pub value: Value,
    pub expected: Expected,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} = {} (expected {})",
            self.group, self.field, self.value, self.expected
        )
    }
}

impl Error {
    /// Per-field violations carried by an `InvalidValue` error
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Error::InvalidValue { violations } => violations,
            _ => &[],
        }
    }

    /// Cross-field errors carried by a `Validation` error
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Error::Validation(errors) => errors,
            _ => &[],
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n  ")
}
