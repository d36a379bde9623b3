//! Load configuration overrides from YAML files and command-line assignments

use super::builder::ConfigBuilder;
use super::merged::MergedConfig;
use crate::args;
use crate::error::{Error, Result};
use crate::runtime::{self, RuntimeFacts};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Read one YAML (or JSON) file into a flat override mapping
///
/// The top level must be a mapping. Keys are normalized so that
/// `num-layers` and `num_layers` name the same field; a file using both
/// spellings for one field is a `ConfigConflict`.
pub fn load_overrides<P: AsRef<Path>>(path: P) -> Result<Map<String, Value>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read config file {}: {}", path.display(), e),
        ))
    })?;

    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let parsed: Value = serde_yaml::from_str(&content)
        .map_err(|e| Error::Parse(format!("Failed to parse {}: {}", path.display(), e)))?;

    let map = match parsed {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(Error::Parse(format!(
                "{}: top level must be a mapping, found {}",
                path.display(),
                kind(&other)
            )))
        }
    };

    let mut normalized = Map::new();
    let mut spelling: HashMap<String, String> = HashMap::new();
    for (key, value) in map {
        let field = normalize_key(&key);
        if let Some(first) = spelling.get(&field) {
            return Err(Error::ConfigConflict {
                key: field,
                sources: vec![
                    format!("{}:{}", path.display(), first),
                    format!("{}:{}", path.display(), key),
                ],
            });
        }
        spelling.insert(field.clone(), key);
        normalized.insert(field, value);
    }

    debug!(path = %path.display(), keys = normalized.len(), "loaded config file");
    Ok(normalized)
}

/// Union several config files; a key set in two files is a conflict
pub fn load_config_files<P: AsRef<Path>>(paths: &[P]) -> Result<Map<String, Value>> {
    let mut merged = Map::new();
    let mut origin: HashMap<String, String> = HashMap::new();

    for path in paths {
        let path = path.as_ref();
        let source = path.display().to_string();
        for (key, value) in load_overrides(path)? {
            if let Some(first) = origin.get(&key) {
                return Err(Error::ConfigConflict {
                    key,
                    sources: vec![first.clone(), source],
                });
            }
            origin.insert(key.clone(), source.clone());
            merged.insert(key, value);
        }
    }

    Ok(merged)
}

/// Parse a `key=value` assignment; the value is read as YAML, so
/// `lr=6e-4`, `norm=rmsnorm` and `train_data_paths=[a, b]` all work
pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let (key, raw) = assignment.split_once('=').ok_or_else(|| {
        Error::Parse(format!("Expected key=value, got '{assignment}'"))
    })?;
    let key = normalize_key(key.trim());
    if key.is_empty() {
        return Err(Error::Parse(format!("Empty key in '{assignment}'")));
    }
    let value: Value = serde_yaml::from_str(raw.trim())
        .map_err(|e| Error::Parse(format!("Invalid value for '{key}': {e}")))?;
    Ok((key, value))
}

pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Load, finalize, inject runtime facts, and validate a NeoX configuration
///
/// This is the main entry point for a training process:
/// 1. Union the config files
/// 2. Apply `key=value` assignments on top
/// 3. Construct and merge all parameter groups
/// 4. Fill derived values
/// 5. Write runtime facts (revision, world size, ranks)
/// 6. Validate, reporting every violation at once
pub fn load_config<P: AsRef<Path>>(
    paths: &[P],
    assignments: &[String],
    facts: Option<&dyn RuntimeFacts>,
) -> Result<MergedConfig> {
    let mut overrides = load_config_files(paths)?;
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        overrides.insert(key, value);
    }

    let mut config = ConfigBuilder::new(args::schemas()?)
        .with_flat(overrides)
        .build()?;
    args::finalize(&mut config)?;
    if let Some(facts) = facts {
        runtime::inject(&mut config, facts)?;
    }
    config.validate()?;

    info!(files = paths.len(), "configuration loaded");
    Ok(config)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
