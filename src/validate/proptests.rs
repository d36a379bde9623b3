//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::validator::{parse_split, validate};
use crate::args::{self, expand_attention_config, AttentionBlock, AttentionType};
use crate::config::MergedConfig;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn arb_valid_overrides() -> impl Strategy<Value = Map<String, Value>> {
    (
        1u64..16,   // num_attention_heads
        1u64..32,   // head dim
        1u64..24,   // num_layers
        1u64..2048, // seq_length
        1e-6f64..1.0,
    )
        .prop_map(|(heads, head_dim, layers, seq, lr)| {
            json!({
                "num_attention_heads": heads,
                "hidden_size": heads * head_dim,
                "num_layers": layers,
                "seq_length": seq,
                "lr": lr,
            })
            .as_object()
            .cloned()
            .unwrap()
        })
}

fn finalized(overrides: Map<String, Value>) -> MergedConfig {
    let mut config = args::from_flat(overrides).unwrap();
    args::finalize(&mut config).unwrap();
    config
}

fn arb_attention_type() -> impl Strategy<Value = AttentionType> {
    prop::sample::select(
        AttentionType::VARIANTS
            .iter()
            .map(|name| name.parse::<AttentionType>().unwrap())
            .collect::<Vec<_>>(),
    )
}

/// Independent violations, each adding exactly one error
fn injections() -> Vec<(&'static str, Value)> {
    vec![
        ("split", json!("50,50")),
        ("min_lr", json!(2.0)),
        ("loss_scale", json!(3.0)),
        ("text_gen_type", json!("input-file")),
        ("zero_contiguous_gradients", json!(true)),
        ("pipe_partition_method", json!("balanced")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_overrides_pass(overrides in arb_valid_overrides()) {
        let errs = validate(&finalized(overrides));
        prop_assert!(errs.is_empty(), "{:?}", errs);
    }

    #[test]
    fn prop_indivisible_hidden_size_fails(overrides in arb_valid_overrides()) {
        let mut overrides = overrides;
        let heads = overrides["num_attention_heads"].as_u64().unwrap();
        prop_assume!(heads > 1);
        let hidden = overrides["hidden_size"].as_u64().unwrap();
        overrides.insert("hidden_size".into(), json!(hidden + 1));
        let errs = validate(&finalized(overrides));
        let is_hidden_error = matches!(errs.as_slice(), [ValidationError::HiddenNotDivisible { .. }]);
        prop_assert!(is_hidden_error, "{:?}", errs);
    }

    #[test]
    fn prop_validation_counts_every_violation(
        overrides in arb_valid_overrides(),
        mask in 0u8..64
    ) {
        let mut overrides = overrides;
        let mut injected = 0;
        for (bit, (field, value)) in injections().into_iter().enumerate() {
            if mask & (1 << bit) != 0 {
                overrides.insert(field.to_string(), value);
                injected += 1;
            }
        }
        let errs = validate(&finalized(overrides));
        prop_assert_eq!(errs.len(), injected, "{:?}", errs);
    }

    #[test]
    fn prop_three_part_split_parses(
        a in 0u32..1000,
        b in 0u32..1000,
        c in 1u32..1000
    ) {
        let split = format!("{a}, {b},{c}");
        let parsed = parse_split(&split).unwrap();
        prop_assert_eq!(parsed, [a as f64, b as f64, c as f64]);
    }

    #[test]
    fn prop_wrong_arity_split_fails(parts in prop::collection::vec(1u32..100, 0..8)) {
        prop_assume!(parts.len() != 3);
        let split = parts.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
        prop_assert!(parse_split(&split).is_err());
    }

    #[test]
    fn prop_attention_expansion_length(
        blocks in prop::collection::vec(
            (prop::collection::vec(arb_attention_type(), 1..4), 0u64..6),
            1..5
        )
    ) {
        let blocks: Vec<AttentionBlock> = blocks
            .into_iter()
            .map(|(types, repeat)| AttentionBlock(types, repeat))
            .collect();
        let expected: u64 = blocks.iter().map(AttentionBlock::layers).sum::<Option<u64>>().unwrap();
        let expanded = expand_attention_config(&blocks);
        prop_assert_eq!(expanded.len() as u64, expected);
    }

    #[test]
    fn prop_matching_attention_config_passes(
        overrides in arb_valid_overrides(),
        ty in arb_attention_type()
    ) {
        let mut overrides = overrides;
        let layers = overrides["num_layers"].as_u64().unwrap();
        overrides.insert("attention_config".into(), json!([[[ty.as_str()], layers]]));
        if ty.is_sparse() {
            overrides.insert("sparsity_config".into(), json!({}));
        }
        let errs = validate(&finalized(overrides));
        prop_assert!(errs.is_empty(), "{:?}", errs);
    }
}
