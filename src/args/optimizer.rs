//! Optimizer selection and ZeRO settings

use super::ArgGroup;
use crate::schema::FieldDescriptor;
use serde::{Deserialize, Serialize};

choice_enum! {
    pub enum OptimizerType {
        Adam => "adam",
        OneBitAdam => "onebitadam",
        CpuAdam => "cpu_adam",
        CpuTorchAdam => "cpu_torch_adam",
        Sm3 => "sm3",
        MadgradWd => "madgrad_wd",
        Adafactor => "adafactor",
    }
}

impl OptimizerType {
    /// Optimizers whose state lives on the host
    pub fn is_cpu_offload(&self) -> bool {
        matches!(self, OptimizerType::CpuAdam | OptimizerType::CpuTorchAdam)
    }
}

impl Default for OptimizerType {
    fn default() -> Self {
        OptimizerType::Adam
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerArgs {
    pub optimizer_type: OptimizerType,
    pub zero_stage: Option<u64>,
    pub zero_reduce_scatter: Option<bool>,
    pub zero_contiguous_gradients: Option<bool>,
    pub zero_reduce_bucket_size: Option<u64>,
    pub zero_allgather_bucket_size: Option<u64>,
    pub lr: Option<f64>,
}

impl ArgGroup for OptimizerArgs {
    const NAME: &'static str = "optimizer";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::choice("optimizer_type", OptimizerType::VARIANTS)
                .default("adam")
                .doc(
                    "Type of optimizer to use. Choose from adam, onebitadam, cpu_adam, \
                     cpu_torch_adam, sm3, madgrad_wd, adafactor.",
                ),
            FieldDescriptor::integer("zero_stage")
                .optional("ZeRO is disabled")
                .bounded(0.0, 3.0)
                .doc("ZeRO optimizer stage, 0 through 3."),
            FieldDescriptor::boolean("zero_reduce_scatter")
                .optional("the engine default applies")
                .doc("ZeRO: use reduce or reduce-scatter instead of allreduce to average gradients."),
            FieldDescriptor::boolean("zero_contiguous_gradients")
                .optional("the engine default applies")
                .doc(
                    "ZeRO: copy gradients to a contiguous buffer as they are produced. Avoids \
                     memory fragmentation during the backward pass.",
                ),
            FieldDescriptor::integer("zero_reduce_bucket_size")
                .optional("the engine default applies")
                .at_least_one()
                .doc("ZeRO: number of elements reduced/allreduced at a time."),
            FieldDescriptor::integer("zero_allgather_bucket_size")
                .optional("the engine default applies")
                .at_least_one()
                .doc("ZeRO: number of elements allgathered at a time."),
            FieldDescriptor::float("lr")
                .required()
                .doc("Maximum learning rate during training."),
        ]
    }
}
