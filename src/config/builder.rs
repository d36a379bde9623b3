//! Build a merged configuration from user overrides
//!
//! Overrides arrive either as one flat mapping (each key routed to the group
//! declaring it) or as per-group mappings. Per-group entries win over flat
//! entries for the same key.

use super::merged::{check_disjoint, merge, MergedConfig};
use crate::error::{Error, FieldViolation, Result, UnknownKey};
use crate::schema::{suggest, GroupSchema, ParameterGroup};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Collects overrides for a set of group schemas, then constructs and
/// merges the groups in one step
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    schemas: Vec<GroupSchema>,
    flat: Map<String, Value>,
    grouped: Vec<(String, Map<String, Value>)>,
}

impl ConfigBuilder {
    pub fn new(schemas: Vec<GroupSchema>) -> Self {
        Self {
            schemas,
            flat: Map::new(),
            grouped: Vec::new(),
        }
    }

    /// Add flat overrides; later calls replace earlier values for a key
    pub fn with_flat(mut self, overrides: Map<String, Value>) -> Self {
        self.flat.extend(overrides);
        self
    }

    /// Set one flat override
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.flat.insert(key.into(), value.into());
        self
    }

    /// Add overrides addressed to one group by name
    pub fn with_group(mut self, group: impl Into<String>, overrides: Map<String, Value>) -> Self {
        self.grouped.push((group.into(), overrides));
        self
    }

    /// Route overrides, construct every group, and merge
    ///
    /// Failure order: duplicate field names across schemas, then unknown
    /// groups, then all unknown keys, then all invalid values.
    pub fn build(self) -> Result<MergedConfig> {
        check_disjoint(&self.schemas)?;

        let per_group = self.route()?;

        let mut groups = Vec::with_capacity(self.schemas.len());
        let mut violations: Vec<FieldViolation> = Vec::new();
        for (schema, overrides) in self.schemas.into_iter().zip(per_group) {
            match ParameterGroup::construct_known(schema, &overrides) {
                Ok(group) => groups.push(group),
                Err(mut found) => violations.append(&mut found),
            }
        }
        if !violations.is_empty() {
            return Err(Error::InvalidValue { violations });
        }

        merge(groups)
    }

    fn route(&self) -> Result<Vec<Map<String, Value>>> {
        let mut owner: HashMap<&str, usize> = HashMap::new();
        for (g, schema) in self.schemas.iter().enumerate() {
            for name in schema.field_names() {
                owner.insert(name, g);
            }
        }
        let all_names = || self.schemas.iter().flat_map(GroupSchema::field_names);

        let mut per_group = vec![Map::new(); self.schemas.len()];
        let mut unknown = Vec::new();

        for (key, value) in &self.flat {
            match owner.get(key.as_str()) {
                Some(&g) => {
                    per_group[g].insert(key.clone(), value.clone());
                }
                None => unknown.push(UnknownKey {
                    group: None,
                    key: key.clone(),
                    suggestion: suggest(key, all_names()),
                }),
            }
        }

        for (group, overrides) in &self.grouped {
            let g = self
                .schemas
                .iter()
                .position(|s| s.name() == group)
                .ok_or_else(|| Error::UnknownGroup(group.clone()))?;
            for (key, value) in overrides {
                if self.schemas[g].field(key).is_some() {
                    per_group[g].insert(key.clone(), value.clone());
                } else {
                    unknown.push(UnknownKey {
                        group: Some(group.clone()),
                        key: key.clone(),
                        suggestion: suggest(key, self.schemas[g].field_names()),
                    });
                }
            }
        }

        if unknown.is_empty() {
            Ok(per_group)
        } else {
            Err(Error::UnknownField { unknown })
        }
    }
}
