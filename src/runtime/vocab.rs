//! Vocabulary padding

use crate::config::MergedConfig;
use crate::error::{Error, Expected, FieldViolation, Result};
use serde_json::Value;
use tracing::debug;

/// Smallest multiple of `divisible_by * model_parallel_size` that holds
/// `raw` tokens, or `None` if that does not fit in a `u64`
///
/// ```
/// use neox_args::runtime::pad_vocab_size;
///
/// assert_eq!(pad_vocab_size(50257, 128, 1), Some(50304));
/// assert_eq!(pad_vocab_size(50257, 128, 2), Some(50432));
/// assert_eq!(pad_vocab_size(50257, 1 << 40, 1 << 30), None);
/// ```
pub fn pad_vocab_size(raw: u64, divisible_by: u64, model_parallel_size: u64) -> Option<u64> {
    let multiple = divisible_by.max(1).checked_mul(model_parallel_size.max(1))?;
    raw.div_ceil(multiple).checked_mul(multiple)
}

/// Pad the tokenizer's raw vocabulary size and record it as
/// `padded_vocab_size`
pub fn apply_padded_vocab(config: &mut MergedConfig, raw: u64) -> Result<u64> {
    let divisible_by = config.unsigned("make_vocab_size_divisible_by").unwrap_or(1);
    let model_parallel = config.unsigned("model_parallel_size").unwrap_or(1);
    let padded = pad_vocab_size(raw, divisible_by, model_parallel).ok_or_else(|| {
        Error::InvalidValue {
            violations: vec![FieldViolation {
                group: config
                    .group_of("make_vocab_size_divisible_by")
                    .unwrap_or_default()
                    .to_string(),
                field: "make_vocab_size_divisible_by".to_string(),
                value: Value::from(divisible_by),
                expected: Expected::Range {
                    min: None,
                    max: Some((u64::MAX / model_parallel.max(1)) as f64),
                },
            }],
        }
    })?;

    debug!(raw, padded, dummy_tokens = padded - raw, "padded vocabulary");
    config.set("padded_vocab_size", padded)?;
    Ok(padded)
}
