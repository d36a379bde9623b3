//! Documentation export for help text and generated reference pages

use super::merged::MergedConfig;
use super::table::Table;
use crate::schema::{display_value, FieldDescriptor, GroupSchema, Mutability, Presence};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything a user needs to know about one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub group: String,
    pub name: String,
    pub value_type: String,
    pub default: Value,
    /// Current value (equals `default` when documenting bare schemas)
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    pub description: String,
    pub mutability: Mutability,
    pub presence: Presence,
}

impl FieldDoc {
    fn new(group: &str, field: &FieldDescriptor, value: &Value) -> Self {
        Self {
            group: group.to_string(),
            name: field.name().to_string(),
            value_type: field.value_type().to_string(),
            default: field.default_value().clone(),
            value: value.clone(),
            choices: field.choices().map(<[String]>::to_vec),
            description: field.description().to_string(),
            mutability: field.mutability(),
            presence: field.presence().clone(),
        }
    }
}

/// Document bare schemas, in group then declaration order
pub fn document_schemas(schemas: &[GroupSchema]) -> Vec<FieldDoc> {
    schemas
        .iter()
        .flat_map(|schema| {
            schema
                .fields()
                .iter()
                .map(move |field| FieldDoc::new(schema.name(), field, field.default_value()))
        })
        .collect()
}

impl MergedConfig {
    /// Document every merged field, including its current value
    pub fn documentation(&self) -> Vec<FieldDoc> {
        self.fields()
            .map(|(group, field, value)| FieldDoc::new(group, field, value))
            .collect()
    }
}

/// Plain-text help: one table per group
pub fn render_text(docs: &[FieldDoc]) -> String {
    let mut out = String::new();
    for (group, fields) in by_group(docs) {
        out.push_str(&format!("[{group}]\n"));
        let mut table =
            Table::new(&["field", "type", "default", "description"]).limit(2, 24).limit(3, 60);
        for doc in fields {
            table.row(vec![
                doc.name.clone(),
                type_label(doc),
                display_value(&doc.default),
                describe(doc),
            ]);
        }
        out.push_str(&table.render());
        out.push('\n');
    }
    out
}

/// Markdown reference: one section per group, one entry per field
pub fn render_markdown(docs: &[FieldDoc]) -> String {
    let mut out = String::from("# Configuration Reference\n");
    for (group, fields) in by_group(docs) {
        out.push_str(&format!("\n## {group}\n"));
        for doc in fields {
            out.push_str(&format!("\n- **{}**: {}\n\n", doc.name, type_label(doc)));
            out.push_str(&format!("  Default = `{}`\n\n", display_value(&doc.default)));
            if doc.mutability != Mutability::Fixed {
                out.push_str(&format!("  Mutability: {}\n\n", doc.mutability));
            }
            for line in describe(doc).lines() {
                out.push_str(&format!("  {}\n", line.trim()));
            }
        }
    }
    out
}

/// JSON array of field docs
pub fn render_json(docs: &[FieldDoc]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(docs)
}

fn type_label(doc: &FieldDoc) -> String {
    match &doc.choices {
        Some(choices) => format!("{} ({})", doc.value_type, choices.join(" | ")),
        None => doc.value_type.clone(),
    }
}

fn describe(doc: &FieldDoc) -> String {
    match &doc.presence {
        Presence::Required => format!("{} [required]", doc.description),
        Presence::Optional(absent) if !absent.is_empty() => {
            format!("{} [if unset: {}]", doc.description, absent)
        }
        _ => doc.description.clone(),
    }
}

fn by_group(docs: &[FieldDoc]) -> Vec<(&str, Vec<&FieldDoc>)> {
    let mut groups: Vec<(&str, Vec<&FieldDoc>)> = Vec::new();
    for doc in docs {
        match groups.last_mut() {
            Some((name, fields)) if *name == doc.group => fields.push(doc),
            _ => groups.push((&doc.group, vec![doc])),
        }
    }
    groups
}
