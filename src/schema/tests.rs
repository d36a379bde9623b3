//! Tests for field descriptors and parameter groups

use super::*;
use crate::error::{Error, Expected};
use serde_json::{json, Map, Value};

fn model_schema() -> GroupSchema {
    GroupSchema::new(
        "model",
        vec![
            FieldDescriptor::integer("num_layers")
                .required()
                .at_least_one()
                .doc("Number of transformer layers."),
            FieldDescriptor::choice("norm", &["layernorm", "rmsnorm", "scalenorm"])
                .default("layernorm")
                .doc("Normalization layer to use."),
            FieldDescriptor::float("rotary_pct")
                .default(1.0)
                .bounded(0.0, 1.0)
                .doc("Fraction of hidden dims to apply rotary embeddings to."),
            FieldDescriptor::integer("padded_vocab_size")
                .optional("computed once the tokenizer is loaded")
                .runtime(),
            FieldDescriptor::boolean("is_pipe_parallel").default(false).derived(),
        ],
    )
    .unwrap()
}

fn overrides(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_choice_default_outside_set_is_schema_error() {
    let err = FieldDescriptor::choice("norm", &["layernorm", "rmsnorm"])
        .default("batchnorm")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
}

#[test]
fn test_defaulted_without_value_is_schema_error() {
    let err = FieldDescriptor::integer("seed")
        .default(Value::Null)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
}

#[test]
fn test_default_of_wrong_type_is_schema_error() {
    let err = FieldDescriptor::integer("seed").default("1234").build().unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
}

#[test]
fn test_choices_on_non_choice_field_is_schema_error() {
    let mut field = FieldDescriptor::choice("x", &["a"]).default("a");
    // re-typing through `new` drops choices, so build one by hand via serde
    let mut raw = serde_json::to_value(&field).unwrap();
    raw["value_type"] = json!({"kind": "string"});
    field = serde_json::from_value(raw).unwrap();
    assert!(matches!(field.build(), Err(Error::Schema { .. })));
}

#[test]
fn test_bounds_on_string_field_is_schema_error() {
    let err = FieldDescriptor::string("name")
        .default("x")
        .bounded(0.0, 1.0)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Schema { .. }));
}

#[test]
fn test_duplicate_field_within_group_is_schema_error() {
    let err = GroupSchema::new(
        "training",
        vec![
            FieldDescriptor::integer("seed").default(1),
            FieldDescriptor::integer("seed").default(2),
        ],
    )
    .unwrap_err();
    match err {
        Error::Schema { group, message } => {
            assert_eq!(group, "training");
            assert!(message.contains("seed"));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_construct_uses_defaults_for_absent_fields() {
    let group = ParameterGroup::construct(model_schema(), &Map::new()).unwrap();
    assert_eq!(group.get("norm"), Some(&json!("layernorm")));
    assert_eq!(group.get("num_layers"), Some(&Value::Null));
    assert_eq!(group.get("rotary_pct"), Some(&json!(1.0)));
}

#[test]
fn test_construct_applies_overrides() {
    let group = ParameterGroup::construct(
        model_schema(),
        &overrides(json!({"num_layers": 24, "norm": "rmsnorm"})),
    )
    .unwrap();
    assert_eq!(group.get("num_layers"), Some(&json!(24)));
    assert_eq!(group.get("norm"), Some(&json!("rmsnorm")));
}

#[test]
fn test_construct_rejects_choice_outside_set() {
    let err = ParameterGroup::construct(model_schema(), &overrides(json!({"norm": "batchnorm"})))
        .unwrap_err();
    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].group, "model");
    assert_eq!(violations[0].field, "norm");
    assert_eq!(violations[0].value, json!("batchnorm"));
    assert_eq!(
        violations[0].expected,
        Expected::OneOf(vec![
            "layernorm".to_string(),
            "rmsnorm".to_string(),
            "scalenorm".to_string()
        ])
    );
    let message = err.to_string();
    assert!(message.contains("batchnorm"));
    assert!(message.contains("layernorm, rmsnorm, scalenorm"));
}

#[test]
fn test_construct_collects_every_invalid_value() {
    let err = ParameterGroup::construct(
        model_schema(),
        &overrides(json!({"num_layers": "twelve", "norm": "batchnorm", "rotary_pct": 2.0})),
    )
    .unwrap_err();
    let fields: Vec<_> = err.violations().iter().map(|v| v.field.as_str()).collect();
    assert_eq!(fields, vec!["num_layers", "norm", "rotary_pct"]);
}

#[test]
fn test_construct_rejects_unknown_key_with_suggestion() {
    let err = ParameterGroup::construct(model_schema(), &overrides(json!({"num_layer": 12})))
        .unwrap_err();
    match err {
        Error::UnknownField { unknown } => {
            assert_eq!(unknown.len(), 1);
            assert_eq!(unknown[0].key, "num_layer");
            assert_eq!(unknown[0].group.as_deref(), Some("model"));
            assert_eq!(unknown[0].suggestion.as_deref(), Some("num_layers"));
        }
        other => panic!("expected unknown field, got {other:?}"),
    }
}

#[test]
fn test_construct_rejects_null_for_defaulted_field() {
    let err = ParameterGroup::construct(model_schema(), &overrides(json!({"norm": null})))
        .unwrap_err();
    assert_eq!(err.violations()[0].expected, Expected::NotNull);
}

#[test]
fn test_assign_respects_mutability() {
    let mut group = ParameterGroup::defaults(model_schema());
    let norm = group.schema().position("norm").unwrap();
    let vocab = group.schema().position("padded_vocab_size").unwrap();
    let pipe = group.schema().position("is_pipe_parallel").unwrap();

    let err = group.assign(norm, json!("rmsnorm"), false).unwrap_err();
    assert!(matches!(
        err,
        Error::ImmutableField {
            mutability: Mutability::Fixed,
            ..
        }
    ));

    group.assign(vocab, json!(50304), true).unwrap();
    assert_eq!(group.get("padded_vocab_size"), Some(&json!(50304)));

    group.assign(pipe, json!(true), false).unwrap();
    assert!(group.assign(pipe, json!(false), true).is_err());
}

#[test]
fn test_assign_checks_type() {
    let mut group = ParameterGroup::defaults(model_schema());
    let vocab = group.schema().position("padded_vocab_size").unwrap();
    let err = group.assign(vocab, json!("big"), false).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { .. }));
    assert_eq!(group.get("padded_vocab_size"), Some(&Value::Null));
}

#[test]
fn test_iter_preserves_declaration_order() {
    let group = ParameterGroup::defaults(model_schema());
    let names: Vec<_> = group.iter().map(|(f, _)| f.name()).collect();
    assert_eq!(
        names,
        vec!["num_layers", "norm", "rotary_pct", "padded_vocab_size", "is_pipe_parallel"]
    );
}
