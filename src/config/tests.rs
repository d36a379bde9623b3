//! Integration tests for config module

use super::*;
use crate::args;
use crate::error::Error;
use crate::runtime::StaticFacts;
use crate::schema::{FieldDescriptor, GroupSchema, ParameterGroup};
use serde_json::{json, Map, Value};
use std::io::Write;
use tempfile::NamedTempFile;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn map(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn group(name: &str, fields: Vec<FieldDescriptor>) -> GroupSchema {
    GroupSchema::new(name, fields).unwrap()
}

const MODEL_YAML: &str = r#"
# GPT-NeoX 125M
pipe-parallel-size: 1
model-parallel-size: 1

num-layers: 12
hidden-size: 768
num-attention-heads: 12
seq-length: 2048
max-position-embeddings: 2048
norm: layernorm
pos-emb: rotary
no-weight-tying: true

attention-config: [[["global"], 12]]

optimizer-type: adam
lr: 0.0006
zero-stage: 0

train-iters: 320000
split: "949, 50, 1"
"#;

const SETUP_YAML: &str = r#"
data_path: data/enwik8/enwik8_text_document
vocab_file: data/gpt2-vocab.json
merge_file: data/gpt2-merges.txt
save: checkpoints
log_dir: logs
use_wandb: false
"#;

#[test]
fn test_end_to_end_config_loading() {
    let model = yaml_file(MODEL_YAML);
    let setup = yaml_file(SETUP_YAML);
    let facts = StaticFacts {
        revision: "1a2b3c4".to_string(),
        world_size: Some(8),
        rank: Some(0),
        local_rank: Some(0),
    };

    let config = load_config(&[model.path(), setup.path()], &[], Some(&facts)).unwrap();

    assert!(config.is_validated());
    assert_eq!(config.unsigned("num_layers"), Some(12));
    assert_eq!(config.string("pos_emb"), Some("rotary"));
    assert_eq!(config.boolean("is_pipe_parallel"), Some(true));
    assert_eq!(config.unsigned("lr_decay_iters"), Some(320000));
    assert_eq!(config.string("data_path"), Some("data/enwik8/enwik8_text_document"));
    assert_eq!(config.string("git_hash"), Some("1a2b3c4"));
    assert_eq!(config.unsigned("global_num_gpus"), Some(8));
}

#[test]
fn test_assignments_override_files() {
    let model = yaml_file(MODEL_YAML);
    let config = load_config(
        &[model.path()],
        &["lr=1e-4".to_string(), "norm=rmsnorm".to_string()],
        None,
    )
    .unwrap();
    assert_eq!(config.float("lr"), Some(1e-4));
    assert_eq!(config.string("norm"), Some("rmsnorm"));
    assert_eq!(config.get("git_hash"), Some(&Value::Null));
}

#[test]
fn test_key_in_two_files_is_conflict() {
    let a = yaml_file("lr: 0.0006\nseed: 1\n");
    let b = yaml_file("lr: 0.0001\n");
    let err = load_config_files(&[a.path(), b.path()]).unwrap_err();
    match err {
        Error::ConfigConflict { key, sources } => {
            assert_eq!(key, "lr");
            assert_eq!(sources.len(), 2);
        }
        other => panic!("Expected ConfigConflict, got {other:?}"),
    }
}

#[test]
fn test_conflict_detected_across_key_spellings() {
    let a = yaml_file("num-layers: 2\n");
    let b = yaml_file("num_layers: 4\n");
    assert!(matches!(
        load_config_files(&[a.path(), b.path()]),
        Err(Error::ConfigConflict { .. })
    ));
}

#[test]
fn test_two_spellings_in_one_file_is_conflict() {
    let file = yaml_file("num-layers: 2\nnum_layers: 48\n");
    let source = file.path().display().to_string();

    let err = load_overrides(file.path()).unwrap_err();
    match err {
        Error::ConfigConflict { key, sources } => {
            assert_eq!(key, "num_layers");
            assert_eq!(
                sources,
                vec![format!("{source}:num-layers"), format!("{source}:num_layers")]
            );
        }
        other => panic!("Expected ConfigConflict, got {other:?}"),
    }
    assert!(matches!(
        load_config_files(&[file.path()]),
        Err(Error::ConfigConflict { .. })
    ));
}

#[test]
fn test_load_overrides_requires_mapping() {
    let file = yaml_file("- lr\n- seed\n");
    assert!(matches!(load_overrides(file.path()), Err(Error::Parse(_))));

    let empty = yaml_file("");
    assert!(load_overrides(empty.path()).unwrap().is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_overrides("/nonexistent/neox.yml").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_parse_assignment() {
    assert_eq!(parse_assignment("lr=6e-4").unwrap(), ("lr".to_string(), json!(0.0006)));
    assert_eq!(
        parse_assignment("train-data-paths=[a, b]").unwrap(),
        ("train_data_paths".to_string(), json!(["a", "b"]))
    );
    assert_eq!(
        parse_assignment("split=969, 30, 1").unwrap().1,
        json!("969, 30, 1")
    );
    assert!(parse_assignment("no-equals-sign").is_err());
    assert!(parse_assignment("=3").is_err());
}

#[test]
fn test_unknown_key_with_suggestion() {
    let err = args::from_flat(map(json!({"num_layer": 2, "hidden_size": 64}))).unwrap_err();
    match err {
        Error::UnknownField { unknown } => {
            assert_eq!(unknown.len(), 1);
            assert_eq!(unknown[0].key, "num_layer");
            assert_eq!(unknown[0].suggestion.as_deref(), Some("num_layers"));
        }
        other => panic!("Expected UnknownField, got {other:?}"),
    }
}

#[test]
fn test_all_unknown_keys_reported() {
    let err = args::from_flat(map(json!({"lrate": 1, "seeed": 2, "totally_new": 3}))).unwrap_err();
    match err {
        Error::UnknownField { unknown } => assert_eq!(unknown.len(), 3),
        other => panic!("Expected UnknownField, got {other:?}"),
    }
}

#[test]
fn test_invalid_values_collected_across_groups() {
    let err = args::from_flat(map(json!({
        "norm": "batchnorm",
        "optimizer_type": "lamb",
        "rotary_pct": 1.5,
    })))
    .unwrap_err();
    let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
    assert_eq!(fields, vec!["norm", "rotary_pct", "optimizer_type"]);
}

#[test]
fn test_duplicate_lr_names_both_groups() {
    let training = group(
        "training",
        vec![FieldDescriptor::float("lr").default(0.001), FieldDescriptor::integer("train_iters").optional("")],
    );
    let optimizer = group("optimizer", vec![FieldDescriptor::float("lr").required()]);

    let err = ConfigBuilder::new(vec![training.clone(), optimizer.clone()])
        .build()
        .unwrap_err();
    match err {
        Error::DuplicateField { collisions } => {
            assert_eq!(collisions.len(), 1);
            assert_eq!(collisions[0].field, "lr");
            assert_eq!(collisions[0].groups, vec!["training", "optimizer"]);
        }
        other => panic!("Expected DuplicateField, got {other:?}"),
    }

    let groups = vec![ParameterGroup::defaults(training), ParameterGroup::defaults(optimizer)];
    assert!(matches!(merge(groups), Err(Error::DuplicateField { .. })));
}

#[test]
fn test_group_overrides_win_over_flat() {
    let config = args::builder()
        .unwrap()
        .set("seed", 1)
        .with_group("other", map(json!({"seed": 42})))
        .build()
        .unwrap();
    assert_eq!(config.unsigned("seed"), Some(42));
}

#[test]
fn test_group_override_must_belong_to_group() {
    let err = args::builder()
        .unwrap()
        .with_group("other", map(json!({"num_layers": 2})))
        .build()
        .unwrap_err();
    match err {
        Error::UnknownField { unknown } => {
            assert_eq!(unknown[0].group.as_deref(), Some("other"));
        }
        other => panic!("Expected UnknownField, got {other:?}"),
    }
}

#[test]
fn test_unknown_group() {
    let err = args::builder()
        .unwrap()
        .with_group("modle", Map::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::UnknownGroup(name) if name == "modle"));
}

#[test]
fn test_flat_export_reimports_identically() {
    let model = yaml_file(MODEL_YAML);
    let config = load_config(&[model.path()], &[], None).unwrap();

    let exported = config.to_flat_map();
    let mut reimported = args::from_flat(exported.clone()).unwrap();
    crate::args::finalize(&mut reimported).unwrap();

    assert_eq!(reimported, config);
    assert_eq!(reimported.to_flat_map(), exported);
}

#[test]
fn test_flat_export_keeps_merge_order() {
    let config = args::defaults().unwrap();
    let keys: Vec<String> = config.to_flat_map().keys().cloned().collect();
    assert_eq!(keys.first().map(String::as_str), Some("pipe_parallel_size"));
    assert_eq!(keys.last().map(String::as_str), Some("eval_tasks"));
}

#[test]
fn test_set_semantics() {
    let mut config = args::defaults().unwrap();

    let err = config.set("num_layers", 4).unwrap_err();
    assert!(matches!(
        err,
        Error::ImmutableField { ref field, .. } if field == "num_layers"
    ));

    config.set("iteration", 100).unwrap();
    assert_eq!(config.unsigned("iteration"), Some(100));

    let err = config.set("iteration", "one hundred").unwrap_err();
    assert_eq!(err.violations().len(), 1);
    assert_eq!(config.unsigned("iteration"), Some(100));

    config.set("is_pipe_parallel", true).unwrap();

    assert!(matches!(config.set("nonexistent", 1), Err(Error::UnknownField { .. })));
}

#[test]
fn test_get_as_typed() {
    let config = args::from_flat(map(json!({"train_data_paths": ["a", "b"]}))).unwrap();
    let paths: Option<Vec<String>> = config.get_as("train_data_paths").unwrap();
    assert_eq!(paths, Some(vec!["a".to_string(), "b".to_string()]));
    let unset: Option<u64> = config.get_as("num_layers").unwrap();
    assert_eq!(unset, None);
    assert!(config.get_as::<u64>("num_layerz").is_err());
    assert_eq!(config.group_of("lr"), Some("optimizer"));
}

#[test]
fn test_documentation_covers_every_field() {
    let config = args::defaults().unwrap();
    let docs = config.documentation();
    assert_eq!(docs.len(), config.len());

    let norm = docs.iter().find(|d| d.name == "norm").unwrap();
    assert_eq!(norm.group, "model");
    assert_eq!(norm.value_type, "choice");
    assert_eq!(
        norm.choices.as_deref(),
        Some(&["layernorm".to_string(), "rmsnorm".to_string(), "scalenorm".to_string()][..])
    );
    assert!(docs.iter().all(|d| !d.description.is_empty()), "every field is described");

    let schema_docs = document_schemas(&args::schemas().unwrap());
    assert_eq!(schema_docs, docs);
}

#[test]
fn test_documentation_json_round_trips() {
    let docs = args::defaults().unwrap().documentation();
    let json = render_json(&docs).unwrap();
    let parsed: Vec<FieldDoc> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, docs);
}

#[test]
fn test_render_text_and_markdown() {
    let docs = args::defaults().unwrap().documentation();

    let text = render_text(&docs);
    assert!(text.starts_with("[parallelism]\n"));
    assert!(text.contains("[text_generation]"));
    assert!(text.contains("│ norm"));

    let markdown = render_markdown(&docs);
    assert!(markdown.starts_with("# Configuration Reference\n"));
    assert!(markdown.contains("\n## lr_scheduler\n"));
    assert!(markdown.contains("- **num_layers**: integer"));
    assert!(markdown.contains("Mutability: settable-at-runtime"));
}
