//! Parameter groups: named collections of field descriptors with values

use super::field::{FieldDescriptor, Mutability};
use crate::error::{Error, FieldViolation, Result, UnknownKey};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// The declaration of a group: its name and ordered field table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl GroupSchema {
    /// Declare a group, failing fast on any malformed field declaration
    /// or on a field name repeated within the group
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for field in &fields {
            field.check_declaration(&name)?;
            if !seen.insert(field.name()) {
                return Err(Error::Schema {
                    group: name,
                    message: format!("field '{}' declared twice", field.name()),
                });
            }
        }
        Ok(Self { name, fields })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescriptor::name)
    }
}

/// A group with a concrete value for each of its fields
///
/// The field set is fixed at construction; only individual values of
/// settable fields may change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGroup {
    schema: GroupSchema,
    values: Vec<Value>,
}

impl ParameterGroup {
    /// Group populated with every declared default
    pub fn defaults(schema: GroupSchema) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|f| f.default_value().clone())
            .collect();
        Self { schema, values }
    }

    /// Construct from defaults plus overrides
    ///
    /// Every unknown key is reported in one `UnknownField` error. If all keys
    /// are known, every invalid value is reported in one `InvalidValue` error.
    pub fn construct(schema: GroupSchema, overrides: &Map<String, Value>) -> Result<Self> {
        let unknown: Vec<UnknownKey> = overrides
            .keys()
            .filter(|key| schema.field(key).is_none())
            .map(|key| UnknownKey {
                group: Some(schema.name.clone()),
                key: key.clone(),
                suggestion: suggest(key, schema.field_names()),
            })
            .collect();
        if !unknown.is_empty() {
            return Err(Error::UnknownField { unknown });
        }

        Self::construct_known(schema, overrides)
            .map_err(|violations| Error::InvalidValue { violations })
    }

    /// Construct from overrides already known to name declared fields
    pub(crate) fn construct_known(
        schema: GroupSchema,
        overrides: &Map<String, Value>,
    ) -> std::result::Result<Self, Vec<FieldViolation>> {
        let mut group = Self::defaults(schema);
        let mut violations = Vec::new();

        for (index, field) in group.schema.fields.iter().enumerate() {
            if let Some(value) = overrides.get(field.name()) {
                match field.check_value(&group.schema.name, value) {
                    Ok(()) => group.values[index] = value.clone(),
                    Err(violation) => violations.push(violation),
                }
            }
        }

        if violations.is_empty() {
            debug!(
                group = %group.schema.name,
                overrides = overrides.len(),
                "constructed parameter group"
            );
            Ok(group)
        } else {
            Err(violations)
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &GroupSchema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).map(|i| &self.values[i])
    }

    /// Fields with their current values, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> {
        self.schema.fields.iter().zip(self.values.iter())
    }

    /// Reassign a settable field, checking it like construction does
    ///
    /// `sealed` is true once the owning configuration has been validated,
    /// which closes pre-validation fields.
    pub(crate) fn assign(&mut self, index: usize, value: Value, sealed: bool) -> Result<()> {
        let field = &self.schema.fields[index];
        let writable = match field.mutability() {
            Mutability::Fixed => false,
            Mutability::PreValidation => !sealed,
            Mutability::Runtime => true,
        };
        if !writable {
            return Err(Error::ImmutableField {
                field: field.name().to_string(),
                mutability: field.mutability(),
            });
        }

        field
            .check_value(&self.schema.name, &value)
            .map_err(|violation| Error::InvalidValue {
                violations: vec![violation],
            })?;

        debug!(group = %self.schema.name, field = field.name(), value = %value, "field updated");
        self.values[index] = value;
        Ok(())
    }

    /// Fill an unset value during finalization, bypassing mutability
    pub(crate) fn fill(&mut self, index: usize, value: Value) -> Result<()> {
        let field = &self.schema.fields[index];
        field
            .check_value(&self.schema.name, &value)
            .map_err(|violation| Error::InvalidValue {
                violations: vec![violation],
            })?;
        self.values[index] = value;
        Ok(())
    }
}

/// Closest candidate to a mistyped key, if it is near enough to be a typo
pub(crate) fn suggest<'a>(key: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    let limit = (key.len() / 3).max(2);
    candidates
        .map(|candidate| (edit_distance(key, candidate), candidate))
        .filter(|(distance, _)| *distance <= limit)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.to_string())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("num_layers", "num_layers"), 0);
        assert_eq!(edit_distance("num_layer", "num_layers"), 1);
        assert_eq!(edit_distance("nmu_layers", "num_layers"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn test_suggest_picks_closest() {
        let names = ["hidden_size", "hidden_dropout", "num_layers"];
        assert_eq!(
            suggest("hiden_size", names.iter().copied()),
            Some("hidden_size".to_string())
        );
        assert_eq!(suggest("completely_unrelated", names.iter().copied()), None);
    }
}
