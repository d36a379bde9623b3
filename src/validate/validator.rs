//! Validation rules
//!
//! Every rule runs; nothing stops at the first failure. Rules read fields by
//! name and skip silently when a field they need is not declared, so custom
//! schemas get whatever subset of rules applies to them.

use super::error::ValidationError;
use crate::args::AttentionType;
use crate::config::MergedConfig;
use crate::schema::{suggest, Presence};
use serde_json::Value;
use tracing::warn;

const DATA_SPLITS: [(&str, &str); 3] = [
    ("train_data_weights", "train_data_paths"),
    ("valid_data_weights", "valid_data_paths"),
    ("test_data_weights", "test_data_paths"),
];

const ZERO_FIELDS: [&str; 4] = [
    "zero_reduce_scatter",
    "zero_contiguous_gradients",
    "zero_reduce_bucket_size",
    "zero_allgather_bucket_size",
];

const SOFT_PROMPT_KEYS: [&str; 4] = ["enabled", "num_tokens", "init_string", "init_range"];

/// Validate a merged configuration
///
/// Returns every violation found, in rule order; an empty list means the
/// configuration is valid.
pub fn validate(config: &MergedConfig) -> Vec<ValidationError> {
    let mut v = Validator {
        config,
        errors: Vec::new(),
    };

    v.check_fields();
    v.check_attention();
    v.check_zero();
    v.check_split();
    v.check_data_sources();
    v.check_model_shape();
    v.check_parallel_layout();
    v.check_learning_rate();
    v.check_text_generation();
    v.check_partition_method();
    v.check_soft_prompt();
    v.check_loss_scale();
    v.check_logging();

    v.errors
}

/// Parse a `split` string into train, validation and test proportions
///
/// ```
/// use neox_args::validate::parse_split;
///
/// assert_eq!(parse_split("969, 30, 1"), Ok([969.0, 30.0, 1.0]));
/// assert!(parse_split("50,50").is_err());
/// ```
pub fn parse_split(split: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = split.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 comma-separated values, found {}", parts.len()));
    }

    let mut values = [0.0; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        let x: f64 = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
        if !x.is_finite() || x < 0.0 {
            return Err(format!("'{part}' is not a non-negative number"));
        }
        *slot = x;
    }

    if values.iter().sum::<f64>() <= 0.0 {
        return Err("proportions sum to zero".to_string());
    }
    Ok(values)
}

struct Validator<'a> {
    config: &'a MergedConfig,
    errors: Vec<ValidationError>,
}

impl<'a> Validator<'a> {
    fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    fn value(&self, name: &str) -> Option<&'a Value> {
        self.config.get(name).filter(|v| !v.is_null())
    }

    fn unsigned(&self, name: &str) -> Option<u64> {
        self.value(name).and_then(Value::as_u64)
    }

    fn float(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_f64)
    }

    fn flag(&self, name: &str) -> bool {
        self.value(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Per-field layer: required values present, every value conforms
    fn check_fields(&mut self) {
        for (group, field, value) in self.config.fields() {
            if value.is_null() {
                if *field.presence() == Presence::Required {
                    self.errors
                        .push(ValidationError::MissingRequired(field.name().to_string()));
                }
                continue;
            }
            if let Err(violation) = field.check_value(group, value) {
                self.errors.push(ValidationError::InvalidField(violation));
            }
        }
    }

    /// attention_config entries well formed, types known, layer count right;
    /// sparsity_config only alongside a sparse type
    fn check_attention(&mut self) {
        let types = match self.value("attention_config") {
            Some(config) => match self.attention_types(config) {
                Some(types) => types,
                None => return,
            },
            None => vec![AttentionType::Global],
        };

        if self.value("sparsity_config").is_some() && !types.iter().any(AttentionType::is_sparse) {
            self.push(ValidationError::SparsityWithoutSparseAttention);
        }
    }

    /// Check attention_config and return the attention types it uses, or
    /// `None` if it is malformed
    fn attention_types(&mut self, config: &Value) -> Option<Vec<AttentionType>> {
        let Some(entries) = config.as_array() else {
            self.push(ValidationError::MalformedAttentionEntry {
                entry: 0,
                reason: "attention_config must be a list of [types, repeat] pairs".to_string(),
            });
            return None;
        };

        let mut types = Vec::new();
        let mut layers: u64 = 0;
        let mut well_formed = true;

        for (entry, block) in entries.iter().enumerate() {
            let pair = block.as_array().filter(|pair| pair.len() == 2);
            let (names, repeat) = match pair.map(|p| (p[0].as_array(), p[1].as_u64())) {
                Some((Some(names), Some(repeat))) => (names, repeat),
                _ => {
                    self.push(ValidationError::MalformedAttentionEntry {
                        entry,
                        reason: format!(
                            "expected [[types...], repeat] with a non-negative repeat, found {block}"
                        ),
                    });
                    well_formed = false;
                    continue;
                }
            };

            for name in names {
                let Some(text) = name.as_str() else {
                    self.push(ValidationError::MalformedAttentionEntry {
                        entry,
                        reason: format!("attention type {name} is not a string"),
                    });
                    well_formed = false;
                    continue;
                };
                match text.parse::<AttentionType>() {
                    Ok(ty) => types.push(ty),
                    Err(_) => {
                        self.push(ValidationError::UnknownAttentionType {
                            entry,
                            name: text.to_string(),
                            suggestion: suggest(text, AttentionType::VARIANTS.iter().copied()),
                        });
                        well_formed = false;
                    }
                }
            }
            layers = layers.saturating_add((names.len() as u64).saturating_mul(repeat));
        }

        if !well_formed {
            return None;
        }

        if let Some(num_layers) = self.unsigned("num_layers") {
            if layers != num_layers {
                self.push(ValidationError::AttentionLayerMismatch { layers, num_layers });
            }
        }
        Some(types)
    }

    /// zero_* tuning fields need ZeRO on; the stage range is a field bound
    fn check_zero(&mut self) {
        if !self.config.contains("zero_stage") {
            return;
        }
        let enabled = self.unsigned("zero_stage").is_some_and(|stage| stage >= 1);
        if enabled {
            return;
        }
        for field in ZERO_FIELDS {
            if self.value(field).is_some() {
                self.push(ValidationError::ZeroFieldWithoutZero(field.to_string()));
            }
        }
    }

    fn check_split(&mut self) {
        let Some(split) = self.value("split").and_then(Value::as_str) else {
            return;
        };
        if let Err(reason) = parse_split(split) {
            self.push(ValidationError::InvalidSplit {
                split: split.to_string(),
                reason,
            });
        }
    }

    /// Data paths and their weights
    fn check_data_sources(&mut self) {
        for (weights, paths) in DATA_SPLITS {
            let Some(w) = self.value(weights).and_then(Value::as_array) else {
                continue;
            };
            match self.value(paths).and_then(Value::as_array) {
                Some(p) if p.len() != w.len() => {
                    self.push(ValidationError::WeightsLengthMismatch {
                        weights: weights.to_string(),
                        paths: paths.to_string(),
                        weights_len: w.len(),
                        paths_len: p.len(),
                    });
                }
                Some(_) => {}
                None => self.push(ValidationError::WeightsWithoutPaths {
                    weights: weights.to_string(),
                    paths: paths.to_string(),
                }),
            }
        }

        if self.flag("weight_by_num_documents")
            && DATA_SPLITS.iter().any(|(w, _)| self.value(w).is_some())
        {
            warn!("weight_by_num_documents is set; user-provided data weights will be ignored");
        }

        if self.value("train_data_paths").is_none() {
            return;
        }
        if self.value("data_path").is_some() {
            self.push(ValidationError::MutuallyExclusive(
                "data_path".to_string(),
                "train_data_paths".to_string(),
            ));
        }
        for required in ["valid_data_paths", "test_data_paths"] {
            if self.config.contains(required) && self.value(required).is_none() {
                self.push(ValidationError::IncompleteDataPaths(required.to_string()));
            }
        }
    }

    /// Head, layer and position counts line up
    fn check_model_shape(&mut self) {
        if let (Some(hidden_size), Some(num_attention_heads)) = (
            self.unsigned("hidden_size"),
            self.unsigned("num_attention_heads"),
        ) {
            if num_attention_heads > 0 && hidden_size % num_attention_heads != 0 {
                self.push(ValidationError::HiddenNotDivisible {
                    hidden_size,
                    num_attention_heads,
                });
            }
        }

        if let (Some(num_layers), Some(num_unique_layers)) = (
            self.unsigned("num_layers"),
            self.unsigned("num_unique_layers"),
        ) {
            if num_unique_layers > 0 && num_layers % num_unique_layers != 0 {
                self.push(ValidationError::LayersNotDivisible {
                    num_layers,
                    num_unique_layers,
                });
            }
        }

        if let (Some(max_position_embeddings), Some(seq_length)) = (
            self.unsigned("max_position_embeddings"),
            self.unsigned("seq_length"),
        ) {
            if max_position_embeddings < seq_length {
                self.push(ValidationError::PositionEmbeddingsTooShort {
                    max_position_embeddings,
                    seq_length,
                });
            }
        }
    }

    /// World size and padded vocabulary fit the parallel layout
    fn check_parallel_layout(&mut self) {
        let model_parallel = self.unsigned("model_parallel_size").unwrap_or(1);

        if let Some(world_size) = self.unsigned("world_size") {
            let stages = self.unsigned("pipe_parallel_size").unwrap_or(0).max(1);
            let per_replica = stages.saturating_mul(model_parallel);
            if per_replica > 0 && world_size % per_replica != 0 {
                self.push(ValidationError::WorldSizeNotDivisible {
                    world_size,
                    per_replica,
                });
            }
        }

        if let (Some(padded_vocab_size), Some(divisor)) = (
            self.unsigned("padded_vocab_size"),
            self.unsigned("make_vocab_size_divisible_by"),
        ) {
            let multiple = divisor.saturating_mul(model_parallel);
            if multiple > 0 && padded_vocab_size % multiple != 0 {
                self.push(ValidationError::VocabNotDivisible {
                    padded_vocab_size,
                    multiple,
                });
            }
        }
    }

    fn check_learning_rate(&mut self) {
        if let Some(lr) = self.float("lr") {
            if lr <= 0.0 {
                self.push(ValidationError::NonPositiveLr(lr));
            } else if let Some(min_lr) = self.float("min_lr") {
                if min_lr > lr {
                    self.push(ValidationError::MinLrAboveLr { min_lr, lr });
                }
            }
        }

        if self.flag("override_lr_scheduler") && self.flag("use_checkpoint_lr_scheduler") {
            self.push(ValidationError::MutuallyExclusive(
                "override_lr_scheduler".to_string(),
                "use_checkpoint_lr_scheduler".to_string(),
            ));
        }
    }

    fn check_text_generation(&mut self) {
        let input_file = self
            .value("text_gen_type")
            .and_then(Value::as_str)
            .is_some_and(|t| t == "input-file");
        if input_file && self.value("sample_input_file").is_none() {
            self.push(ValidationError::MissingSampleInput);
        }

        let top_k = self.unsigned("top_k").unwrap_or(0);
        let top_p = self.float("top_p").unwrap_or(0.0);
        if top_k > 0 && top_p > 0.0 {
            self.push(ValidationError::MutuallyExclusive(
                "top_k".to_string(),
                "top_p".to_string(),
            ));
        }
    }

    fn check_partition_method(&mut self) {
        let Some(method) = self.value("pipe_partition_method").and_then(Value::as_str) else {
            return;
        };
        let valid = match method {
            "parameters" | "uniform" => true,
            other => other
                .strip_prefix("type:")
                .is_some_and(|pattern| !pattern.is_empty()),
        };
        if !valid {
            self.push(ValidationError::InvalidPartitionMethod(method.to_string()));
        }
    }

    fn check_soft_prompt(&mut self) {
        let Some(settings) = self.value("soft_prompt_tuning").and_then(Value::as_object) else {
            return;
        };

        let unknown: Vec<&str> = settings
            .keys()
            .map(String::as_str)
            .filter(|key| !SOFT_PROMPT_KEYS.contains(key))
            .collect();
        if !unknown.is_empty() {
            self.push(ValidationError::InvalidSoftPrompt(format!(
                "unknown key(s) {} (allowed: {})",
                unknown.join(", "),
                SOFT_PROMPT_KEYS.join(", ")
            )));
            return;
        }

        let typed = serde_json::from_value::<crate::args::SoftPromptTuning>(Value::Object(
            settings.clone(),
        ));
        if let Err(e) = typed {
            self.push(ValidationError::InvalidSoftPrompt(e.to_string()));
        }
    }

    fn check_loss_scale(&mut self) {
        if let Some(scale) = self.float("loss_scale") {
            let power_of_two = scale > 0.0 && scale.is_finite() && scale.log2().fract() == 0.0;
            if !power_of_two {
                self.push(ValidationError::InvalidLossScale(scale));
            }
        }
    }

    fn check_logging(&mut self) {
        if self.flag("log_grad_norm") {
            let stages = self.unsigned("pipe_parallel_size").unwrap_or(0);
            if stages != 0 {
                self.push(ValidationError::GradNormWithPipeline(stages));
            }
        }
    }
}
