//! Learning-rate schedule

use super::ArgGroup;
use crate::schema::FieldDescriptor;
use serde::{Deserialize, Serialize};

choice_enum! {
    pub enum LrDecayStyle {
        Constant => "constant",
        Linear => "linear",
        Cosine => "cosine",
        Exponential => "exponential",
    }
}

impl Default for LrDecayStyle {
    fn default() -> Self {
        LrDecayStyle::Linear
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LrSchedulerArgs {
    pub lr_decay_style: LrDecayStyle,
    pub lr_decay_iters: Option<u64>,
    pub min_lr: f64,
    pub warmup: f64,
    pub override_lr_scheduler: bool,
    pub use_checkpoint_lr_scheduler: bool,
}

impl Default for LrSchedulerArgs {
    fn default() -> Self {
        Self {
            lr_decay_style: LrDecayStyle::default(),
            lr_decay_iters: None,
            min_lr: 0.0,
            warmup: 0.01,
            override_lr_scheduler: false,
            use_checkpoint_lr_scheduler: false,
        }
    }
}

impl LrSchedulerArgs {
    /// Warmup length in iterations for a run of `decay_iters`, rounded to
    /// the nearest iteration
    pub fn warmup_iters(&self, decay_iters: u64) -> u64 {
        (self.warmup * decay_iters as f64).round() as u64
    }
}

impl ArgGroup for LrSchedulerArgs {
    const NAME: &'static str = "lr_scheduler";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::choice("lr_decay_style", LrDecayStyle::VARIANTS)
                .default("linear")
                .doc("Learning rate decay function: constant, linear, cosine or exponential."),
            FieldDescriptor::integer("lr_decay_iters")
                .optional("set to train_iters")
                .at_least_one()
                .doc("Number of iterations to decay the learning rate over."),
            FieldDescriptor::float("min_lr")
                .default(0.0)
                .non_negative()
                .doc("Minimum learning rate. The scheduler clips values below this threshold."),
            FieldDescriptor::float("warmup")
                .default(0.01)
                .bounded(0.0, 1.0)
                .doc("Fraction of total iterations to warm up over (0.01 is 1 percent)."),
            FieldDescriptor::boolean("override_lr_scheduler")
                .default(false)
                .doc(
                    "Take the scheduler values (learning rate, warmup, minimum learning rate, \
                     decay iterations and style) from these arguments and ignore the checkpoint.",
                ),
            FieldDescriptor::boolean("use_checkpoint_lr_scheduler")
                .default(false)
                .doc(
                    "Take the scheduler values from the checkpoint and ignore these arguments.",
                ),
        ]
    }
}
