//! Field descriptors: one named, typed, defaulted configuration value

use super::value::{ElementType, ValueType};
use crate::error::{Error, Expected, FieldViolation, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// When a field may be written after its group is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// User-configurable; only set through construction overrides
    Fixed,
    /// Computed by the system from other fields; writable until validation
    PreValidation,
    /// Written during the process lifecycle (ranks, counters, discovered sizes)
    Runtime,
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutability::Fixed => write!(f, "fixed-at-construction"),
            Mutability::PreValidation => write!(f, "settable-pre-validation"),
            Mutability::Runtime => write!(f, "settable-at-runtime"),
        }
    }
}

/// Whether a field has a concrete default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Carries a concrete default value
    Defaulted,
    /// Unset by default and must be supplied before validation passes
    Required,
    /// Unset by default; absence is legitimate and has the documented effect
    Optional(String),
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bounds {
    pub fn contains(&self, x: f64) -> bool {
        self.min.map_or(true, |lo| x >= lo) && self.max.map_or(true, |hi| x <= hi)
    }
}

/// Declaration of a single configuration field
///
/// Built with the constructor for its type followed by builder methods:
///
/// ```
/// use neox_args::schema::FieldDescriptor;
///
/// let norm = FieldDescriptor::choice("norm", &["layernorm", "rmsnorm", "scalenorm"])
///     .default("layernorm")
///     .doc("Normalization layer to use.")
///     .build()
///     .unwrap();
/// assert_eq!(norm.name(), "norm");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    name: String,
    value_type: ValueType,
    default: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bounds: Option<Bounds>,
    description: String,
    mutability: Mutability,
    presence: Presence,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: Value::Null,
            choices: None,
            bounds: None,
            description: String::new(),
            mutability: Mutability::Fixed,
            presence: Presence::Required,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::String)
    }

    pub fn choice(name: impl Into<String>, choices: &[&str]) -> Self {
        let mut field = Self::new(name, ValueType::Choice);
        field.choices = Some(choices.iter().map(|c| c.to_string()).collect());
        field
    }

    pub fn list(name: impl Into<String>, element: ElementType) -> Self {
        Self::new(name, ValueType::List(element))
    }

    pub fn mapping(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Mapping)
    }

    /// Set a concrete default
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self.presence = Presence::Defaulted;
        self
    }

    /// Mark the field as unset by default, with `when_absent` describing
    /// what downstream does if it stays unset
    pub fn optional(mut self, when_absent: impl Into<String>) -> Self {
        self.default = Value::Null;
        self.presence = Presence::Optional(when_absent.into());
        self
    }

    /// Mark the field as unset by default but required before validation
    pub fn required(mut self) -> Self {
        self.default = Value::Null;
        self.presence = Presence::Required;
        self
    }

    pub fn doc(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn runtime(mut self) -> Self {
        self.mutability = Mutability::Runtime;
        self
    }

    pub fn derived(mut self) -> Self {
        self.mutability = Mutability::PreValidation;
        self
    }

    pub fn bounded(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some(Bounds {
            min: Some(min),
            max: Some(max),
        });
        self
    }

    pub fn non_negative(mut self) -> Self {
        self.bounds = Some(Bounds {
            min: Some(0.0),
            max: None,
        });
        self
    }

    /// At least one; meant for integer counts and sizes
    pub fn at_least_one(mut self) -> Self {
        self.bounds = Some(Bounds {
            min: Some(1.0),
            max: None,
        });
        self
    }

    /// Check the declaration for internal consistency
    pub fn build(self) -> Result<Self> {
        self.check_declaration("<standalone>")?;
        Ok(self)
    }

    pub(crate) fn check_declaration(&self, group: &str) -> Result<()> {
        let fail = |message: String| {
            Err(Error::Schema {
                group: group.to_string(),
                message,
            })
        };

        if self.name.is_empty() {
            return fail("field with empty name".to_string());
        }

        match (&self.value_type, &self.choices) {
            (ValueType::Choice, None) => {
                return fail(format!("choice field '{}' has no choices", self.name));
            }
            (ValueType::Choice, Some(choices)) if choices.is_empty() => {
                return fail(format!("choice field '{}' has an empty choice set", self.name));
            }
            (ty, Some(_)) if *ty != ValueType::Choice => {
                return fail(format!(
                    "field '{}' of type {} declares choices",
                    self.name, ty
                ));
            }
            _ => {}
        }

        if self.bounds.is_some() && !self.value_type.is_numeric() {
            return fail(format!(
                "field '{}' of type {} declares numeric bounds",
                self.name, self.value_type
            ));
        }

        if self.presence == Presence::Defaulted && self.default.is_null() {
            return fail(format!("field '{}' is defaulted but has no default", self.name));
        }

        if !self.default.is_null() {
            if let Err(violation) = self.check_value(group, &self.default) {
                return fail(format!(
                    "default for '{}' is invalid: {} is not {}",
                    self.name, violation.value, violation.expected
                ));
            }
        }

        Ok(())
    }

    /// Per-field conformance: type, choice membership, bounds, nullability
    pub fn check_value(&self, group: &str, value: &Value) -> std::result::Result<(), FieldViolation> {
        let violation = |expected: Expected| FieldViolation {
            group: group.to_string(),
            field: self.name.clone(),
            value: value.clone(),
            expected,
        };

        if value.is_null() {
            return match self.presence {
                Presence::Defaulted => Err(violation(Expected::NotNull)),
                _ => Ok(()),
            };
        }

        if !self.value_type.accepts(value) {
            return Err(violation(Expected::Type(self.value_type)));
        }

        if let (Some(choices), Some(text)) = (&self.choices, value.as_str()) {
            if !choices.iter().any(|c| c == text) {
                return Err(violation(Expected::OneOf(choices.clone())));
            }
        }

        if let (Some(bounds), Some(x)) = (&self.bounds, value.as_f64()) {
            if !bounds.contains(x) {
                return Err(violation(Expected::Range {
                    min: bounds.min,
                    max: bounds.max,
                }));
            }
        }

        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }
}
