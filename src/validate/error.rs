//! Validation error types
//!
//! One variant per rule, so callers can match on what went wrong.

use crate::error::FieldViolation;

/// A single per-field or cross-field validation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidField(FieldViolation),

    #[error("Required field '{0}' is not set")]
    MissingRequired(String),

    #[error("attention_config[{entry}] is malformed: {reason}")]
    MalformedAttentionEntry { entry: usize, reason: String },

    #[error("attention_config[{entry}]: unknown attention type '{name}'{}", did_you_mean(.suggestion))]
    UnknownAttentionType {
        entry: usize,
        name: String,
        suggestion: Option<String>,
    },

    #[error("attention_config covers {layers} layer(s) but num_layers is {num_layers}")]
    AttentionLayerMismatch { layers: u64, num_layers: u64 },

    #[error("sparsity_config is set but no layer uses a sparse attention type")]
    SparsityWithoutSparseAttention,

    #[error("'{0}' only applies with ZeRO enabled (zero_stage >= 1)")]
    ZeroFieldWithoutZero(String),

    #[error("Invalid split '{split}': {reason}")]
    InvalidSplit { split: String, reason: String },

    #[error("{weights} has {weights_len} entries but {paths} has {paths_len}")]
    WeightsLengthMismatch {
        weights: String,
        paths: String,
        weights_len: usize,
        paths_len: usize,
    },

    #[error("{weights} is set but {paths} is not")]
    WeightsWithoutPaths { weights: String, paths: String },

    #[error("'{0}' and '{1}' are mutually exclusive")]
    MutuallyExclusive(String, String),

    #[error("train_data_paths requires {0} to be set")]
    IncompleteDataPaths(String),

    #[error("hidden_size {hidden_size} is not divisible by num_attention_heads {num_attention_heads}")]
    HiddenNotDivisible {
        hidden_size: u64,
        num_attention_heads: u64,
    },

    #[error("num_layers {num_layers} is not divisible by num_unique_layers {num_unique_layers}")]
    LayersNotDivisible {
        num_layers: u64,
        num_unique_layers: u64,
    },

    #[error(
        "max_position_embeddings {max_position_embeddings} is smaller than seq_length {seq_length}"
    )]
    PositionEmbeddingsTooShort {
        max_position_embeddings: u64,
        seq_length: u64,
    },

    #[error(
        "world_size {world_size} is not divisible by pipeline stages x model parallel size ({per_replica})"
    )]
    WorldSizeNotDivisible { world_size: u64, per_replica: u64 },

    #[error("padded_vocab_size {padded_vocab_size} is not a multiple of {multiple}")]
    VocabNotDivisible { padded_vocab_size: u64, multiple: u64 },

    #[error("Invalid learning rate: {0} (must be > 0.0)")]
    NonPositiveLr(f64),

    #[error("min_lr {min_lr} is greater than lr {lr}")]
    MinLrAboveLr { min_lr: f64, lr: f64 },

    #[error("text_gen_type 'input-file' requires sample_input_file")]
    MissingSampleInput,

    #[error(
        "Invalid pipe_partition_method '{0}' (must be one of: parameters, uniform, type:<regex>)"
    )]
    InvalidPartitionMethod(String),

    #[error("Invalid soft_prompt_tuning: {0}")]
    InvalidSoftPrompt(String),

    #[error("Invalid loss_scale: {0} (must be a positive power of two)")]
    InvalidLossScale(f64),

    #[error("log_grad_norm requires pipe_parallel_size 0 (found {0})")]
    GradNormWithPipeline(u64),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}
