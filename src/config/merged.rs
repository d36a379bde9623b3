//! The merged configuration: every group's fields in one flat namespace

use crate::error::{Error, FieldCollision, Result, UnknownKey};
use crate::schema::{suggest, FieldDescriptor, GroupSchema, ParameterGroup};
use crate::validate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// All parameter groups of a run, addressable by field name alone
///
/// Field order is group order, then declaration order within each group.
/// Equality compares field values only, not validation state.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    groups: Vec<ParameterGroup>,
    index: HashMap<String, (usize, usize)>,
    validated: bool,
}

/// Merge groups into one namespace, rejecting any field name declared by
/// more than one group
pub fn merge(groups: Vec<ParameterGroup>) -> Result<MergedConfig> {
    check_disjoint(groups.iter().map(ParameterGroup::schema))?;

    let mut index = HashMap::new();
    for (g, group) in groups.iter().enumerate() {
        for (f, name) in group.schema().field_names().enumerate() {
            index.insert(name.to_string(), (g, f));
        }
    }

    debug!(
        groups = groups.len(),
        fields = index.len(),
        "merged parameter groups"
    );

    Ok(MergedConfig {
        groups,
        index,
        validated: false,
    })
}

/// Fail with every cross-group name collision
pub(crate) fn check_disjoint<'a>(
    schemas: impl IntoIterator<Item = &'a GroupSchema>,
) -> Result<()> {
    let mut owners: Vec<(&str, Vec<String>)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for schema in schemas {
        for name in schema.field_names() {
            match position.get(name) {
                Some(&i) => owners[i].1.push(schema.name().to_string()),
                None => {
                    position.insert(name, owners.len());
                    owners.push((name, vec![schema.name().to_string()]));
                }
            }
        }
    }

    let collisions: Vec<FieldCollision> = owners
        .into_iter()
        .filter(|(_, groups)| groups.len() > 1)
        .map(|(field, groups)| FieldCollision {
            field: field.to_string(),
            groups,
        })
        .collect();

    if collisions.is_empty() {
        Ok(())
    } else {
        Err(Error::DuplicateField { collisions })
    }
}

impl MergedConfig {
    pub fn groups(&self) -> &[ParameterGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&ParameterGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Current value of a field; `Value::Null` when unset
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index
            .get(name)
            .and_then(|&(g, _)| self.groups[g].get(name))
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index
            .get(name)
            .and_then(|&(g, f)| self.groups[g].schema().fields().get(f))
    }

    /// Name of the group declaring a field
    pub fn group_of(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&(g, _)| self.groups[g].name())
    }

    /// Deserialize a field into a Rust type; `Ok(None)` when unset
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            None => Err(self.unknown(name)),
            Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::Parse(format!("field '{name}': {e}"))),
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn unsigned(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// True when the field is declared and holds a concrete value
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    /// Reassign a settable field
    ///
    /// Fixed fields always fail with `ImmutableField`; pre-validation fields
    /// fail once [`validate`](Self::validate) has succeeded. The new value
    /// gets the same type/choice check as at construction.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let &(g, f) = self.index.get(name).ok_or_else(|| self.unknown(name))?;
        self.groups[g].assign(f, value.into(), self.validated)
    }

    /// Write a value during finalization regardless of mutability
    pub(crate) fn fill(&mut self, name: &str, value: Value) -> Result<()> {
        let &(g, f) = self.index.get(name).ok_or_else(|| self.unknown(name))?;
        self.groups[g].fill(f, value)
    }

    /// Every field with its group and current value, in merge order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor, &Value)> {
        self.groups
            .iter()
            .flat_map(|group| group.iter().map(move |(field, value)| (group.name(), field, value)))
    }

    /// All fields as one flat mapping, in merge order
    pub fn to_flat_map(&self) -> Map<String, Value> {
        self.fields()
            .map(|(_, field, value)| (field.name().to_string(), value.clone()))
            .collect()
    }

    /// One group's fields as a mapping
    pub fn group_map(&self, group: &str) -> Option<Map<String, Value>> {
        self.group(group).map(|g| {
            g.iter()
                .map(|(field, value)| (field.name().to_string(), value.clone()))
                .collect()
        })
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Run every per-field and cross-field check
    ///
    /// On success the configuration is sealed: pre-validation fields become
    /// immutable. On failure every violation is returned at once.
    pub fn validate(&mut self) -> Result<()> {
        let errors = validate::validate(self);
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }
        self.validated = true;
        info!(fields = self.len(), "configuration validated");
        Ok(())
    }

    fn unknown(&self, name: &str) -> Error {
        Error::UnknownField {
            unknown: vec![UnknownKey {
                group: None,
                key: name.to_string(),
                suggestion: suggest(name, self.index.keys().map(String::as_str)),
            }],
        }
    }
}

impl PartialEq for MergedConfig {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}
