//! Derived values filled in after merge and before validation

use crate::config::MergedConfig;
use crate::error::Result;
use serde_json::{json, Value};
use tracing::debug;

/// Fill derived fields
///
/// Only unset values are filled, apart from pure derivations such as
/// `is_pipe_parallel` which are always recomputed, so running this twice
/// leaves the configuration unchanged. Fields not declared by the
/// configuration's schema are skipped.
pub fn finalize(config: &mut MergedConfig) -> Result<()> {
    if let Some(stages) = config.unsigned("pipe_parallel_size") {
        derive(config, "is_pipe_parallel", json!(stages >= 1))?;
    }

    if let Some(seq_length) = config.unsigned("seq_length") {
        fill_unset(config, "max_position_embeddings", json!(seq_length))?;
    }

    if let Some(train_iters) = config.unsigned("train_iters") {
        fill_unset(config, "lr_decay_iters", json!(train_iters))?;
    }

    if config.contains("loss_scale") {
        let dynamic = !config.is_set("loss_scale");
        fill_unset(config, "dynamic_loss_scale", json!(dynamic))?;
    }

    if let Some(num_layers) = config.unsigned("num_layers") {
        fill_unset(config, "attention_config", json!([[["global"], num_layers]]))?;
    }

    if config.boolean("apply_query_key_layer_scaling") == Some(true) {
        derive(config, "attention_softmax_in_fp32", json!(true))?;
    }

    if config.boolean("lazy_mpu_init") == Some(true) {
        derive(config, "use_cpu_initialization", json!(true))?;
    }

    Ok(())
}

fn fill_unset(config: &mut MergedConfig, name: &str, value: Value) -> Result<()> {
    if config.contains(name) && !config.is_set(name) {
        debug!(field = name, value = %value, "derived");
        config.fill(name, value)?;
    }
    Ok(())
}

fn derive(config: &mut MergedConfig, name: &str, value: Value) -> Result<()> {
    if config.contains(name) && config.get(name) != Some(&value) {
        debug!(field = name, value = %value, "derived");
        config.fill(name, value)?;
    }
    Ok(())
}
