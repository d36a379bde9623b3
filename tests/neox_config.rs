//! End-to-end tests: YAML files through to the typed argument view

use neox_args::args::{AttentionBlock, AttentionType, NeoXArgs, Norm, OptimizerType, PosEmb};
use neox_args::config::load_config;
use neox_args::runtime::{apply_padded_vocab, Handle, RuntimeContext, StaticFacts};
use neox_args::validate::ValidationError;
use neox_args::Error;
use std::io::Write;
use tempfile::NamedTempFile;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const SPARSE_MODEL: &str = r#"
pipe-parallel-size: 2
model-parallel-size: 2

num-layers: 24
hidden-size: 2048
num-attention-heads: 16
seq-length: 2048
norm: rmsnorm
pos-emb: rotary
rotary-pct: 0.25

attention-config: [[["global", "sparse_fixed"], 12]]
sparsity-config:
  block: 16

optimizer-type: adam
lr: 0.0002
min-lr: 0.00002
zero-stage: 1
zero-reduce-bucket-size: 500000000

train-iters: 150000
lr-decay-style: cosine
warmup: 0.01
"#;

const DATA_SETUP: &str = r#"
train-data-paths: [data/pile_00, data/pile_01]
valid-data-paths: [data/pile_val]
test-data-paths: [data/pile_test]
train-data-weights: [0.7, 0.3]
vocab-file: data/20B_tokenizer.json
tokenizer-type: HFTokenizer
save: checkpoints
load: checkpoints
"#;

fn facts() -> StaticFacts {
    StaticFacts {
        revision: "deadbee".to_string(),
        world_size: Some(16),
        rank: Some(5),
        local_rank: Some(5),
    }
}

#[test]
fn test_sparse_model_loads_and_types() {
    let model = yaml_file(SPARSE_MODEL);
    let data = yaml_file(DATA_SETUP);
    let config = load_config(&[model.path(), data.path()], &[], Some(&facts())).unwrap();

    let args = NeoXArgs::from_config(&config).unwrap();
    assert_eq!(args.model.num_layers, Some(24));
    assert_eq!(args.model.norm, Norm::RmsNorm);
    assert_eq!(args.model.pos_emb, PosEmb::Rotary);
    assert_eq!(args.model.head_dim(), Some(128));
    assert_eq!(
        args.model.attention_config,
        Some(vec![AttentionBlock(
            vec![AttentionType::Global, AttentionType::SparseFixed],
            12
        )])
    );
    assert_eq!(args.optimizer.optimizer_type, OptimizerType::Adam);
    assert_eq!(args.lr_scheduler.lr_decay_iters, Some(150000));
    assert_eq!(args.lr_scheduler.warmup_iters(150000), 1500);
    assert!(args.parallelism.is_pipe_parallel);
    assert_eq!(args.parallelism.data_parallel_size(), Some(4));
    assert_eq!(args.logging.git_hash.as_deref(), Some("deadbee"));
    assert_eq!(args.training.effective_train_weights(), Some(vec![0.7, 0.3]));
    assert_eq!(args.training.dynamic_loss_scale, Some(true));

    assert_eq!(args.to_flat_map().unwrap(), config.to_flat_map());
}

#[test]
fn test_every_violation_is_reported_at_load() {
    let model = yaml_file(SPARSE_MODEL);
    let err = load_config(
        &[model.path()],
        &[
            "hidden-size=2050".to_string(),
            "num-layers=20".to_string(),
            "min-lr=0.5".to_string(),
        ],
        Some(&facts()),
    )
    .unwrap_err();

    let errors = err.validation_errors();
    assert!(matches!(err, Error::Validation(_)));
    assert!(errors.contains(&ValidationError::HiddenNotDivisible {
        hidden_size: 2050,
        num_attention_heads: 16,
    }));
    assert!(errors.contains(&ValidationError::AttentionLayerMismatch {
        layers: 24,
        num_layers: 20,
    }));
    assert!(errors.contains(&ValidationError::MinLrAboveLr {
        min_lr: 0.5,
        lr: 0.0002,
    }));
}

#[test]
fn test_world_size_must_fit_parallel_layout() {
    let model = yaml_file(SPARSE_MODEL);
    let facts = StaticFacts {
        world_size: Some(6),
        ..facts()
    };
    let err = load_config(&[model.path()], &[], Some(&facts)).unwrap_err();
    assert_eq!(
        err.validation_errors(),
        &[ValidationError::WorldSizeNotDivisible {
            world_size: 6,
            per_replica: 4,
        }]
    );
}

#[test]
fn test_runtime_writes_after_load() {
    let model = yaml_file(SPARSE_MODEL);
    let mut config = load_config(&[model.path()], &[], None).unwrap();
    assert!(config.is_validated());

    let padded = apply_padded_vocab(&mut config, 50277).unwrap();
    assert_eq!(padded, 50432);
    assert_eq!(config.unsigned("padded_vocab_size"), Some(50432));
    config.set("iteration", 1000).unwrap();

    assert!(matches!(
        config.set("hidden_size", 4096),
        Err(Error::ImmutableField { .. })
    ));
    assert_eq!(config.unsigned("hidden_size"), Some(2048));
}

#[test]
fn test_runtime_handles_live_outside_config() {
    struct Tokenizer {
        vocab_size: u64,
    }

    let model = yaml_file(SPARSE_MODEL);
    let config = load_config(&[model.path()], &[], None).unwrap();

    let mut context = RuntimeContext::new();
    context.insert(Handle::Tokenizer, Tokenizer { vocab_size: 50277 });

    let tokenizer = context.get::<Tokenizer>(Handle::Tokenizer).unwrap();
    assert_eq!(tokenizer.vocab_size, 50277);
    assert!(!config.to_flat_map().contains_key("tokenizer"));
}
