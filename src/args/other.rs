//! Miscellaneous process settings and lifecycle counters

use super::ArgGroup;
use crate::schema::FieldDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OtherArgs {
    pub distributed_backend: String,
    pub local_rank: Option<u64>,
    pub rank: Option<u64>,
    pub lazy_mpu_init: bool,
    pub short_seq_prob: f64,
    pub eod_mask_loss: bool,
    pub adlr_autoresume: bool,
    pub adlr_autoresume_interval: u64,
    pub seed: u64,
    pub onnx_safe: bool,
    pub deepscale: bool,
    pub deepscale_config: Option<String>,
    pub deepspeed_mpi: bool,
    pub user_script: Option<String>,
    pub iteration: Option<u64>,
    pub do_train: Option<u64>,
    pub do_valid: Option<u64>,
    pub do_test: Option<u64>,
    pub global_num_gpus: Option<u64>,
}

impl Default for OtherArgs {
    fn default() -> Self {
        Self {
            distributed_backend: "nccl".to_string(),
            local_rank: None,
            rank: None,
            lazy_mpu_init: false,
            short_seq_prob: 0.1,
            eod_mask_loss: false,
            adlr_autoresume: false,
            adlr_autoresume_interval: 1000,
            seed: 1234,
            onnx_safe: false,
            deepscale: false,
            deepscale_config: None,
            deepspeed_mpi: false,
            user_script: None,
            iteration: None,
            do_train: None,
            do_valid: None,
            do_test: None,
            global_num_gpus: None,
        }
    }
}

impl ArgGroup for OtherArgs {
    const NAME: &'static str = "other";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::string("distributed_backend")
                .default("nccl")
                .doc("Backend used for distributed training."),
            FieldDescriptor::integer("local_rank")
                .optional("not yet launched")
                .non_negative()
                .runtime()
                .doc("Local rank passed from the distributed launcher."),
            FieldDescriptor::integer("rank")
                .optional("not yet launched")
                .non_negative()
                .runtime()
                .doc("Global rank of this process, passed from the distributed launcher."),
            FieldDescriptor::boolean("lazy_mpu_init")
                .default(false)
                .doc(
                    "Skip DDP initialization and hand back a function that completes it, for \
                     an external DDP manager. Also turns on use_cpu_initialization.",
                ),
            FieldDescriptor::float("short_seq_prob")
                .default(0.1)
                .bounded(0.0, 1.0)
                .doc("Probability of producing a short sequence."),
            FieldDescriptor::boolean("eod_mask_loss")
                .default(false)
                .doc("Mask the loss for end-of-document tokens."),
            FieldDescriptor::boolean("adlr_autoresume")
                .default(false)
                .doc("Enable auto-resume on the ADLR cluster."),
            FieldDescriptor::integer("adlr_autoresume_interval")
                .default(1000)
                .at_least_one()
                .doc("Iterations between checks for the auto-resume termination signal."),
            FieldDescriptor::integer("seed")
                .default(1234)
                .non_negative()
                .doc("Random seed for every random number generator."),
            FieldDescriptor::boolean("onnx_safe")
                .default(false)
                .doc("Use workarounds for known problems with the ONNX exporter."),
            FieldDescriptor::boolean("deepscale")
                .default(false)
                .doc("Deprecated. Enable DeepSpeed (helper flag for user code only)."),
            FieldDescriptor::string("deepscale_config")
                .optional("no deepscale configuration file")
                .doc("Deprecated. DeepScale JSON configuration file."),
            FieldDescriptor::boolean("deepspeed_mpi")
                .default(false)
                .doc("Discover the distributed environment from MPI."),
            FieldDescriptor::string("user_script")
                .optional("the default training entry point runs")
                .doc("User script to be run."),
            FieldDescriptor::integer("iteration")
                .optional("training has not started")
                .non_negative()
                .runtime()
                .doc("Current iteration. Set during training."),
            FieldDescriptor::integer("do_train")
                .optional("not yet decided")
                .non_negative()
                .runtime()
                .doc("Whether a training split exists. Set during training."),
            FieldDescriptor::integer("do_valid")
                .optional("not yet decided")
                .non_negative()
                .runtime()
                .doc("Whether a validation split exists. Set during training."),
            FieldDescriptor::integer("do_test")
                .optional("not yet decided")
                .non_negative()
                .runtime()
                .doc("Whether a test split exists. Set during training."),
            FieldDescriptor::integer("global_num_gpus")
                .optional("not yet launched")
                .at_least_one()
                .runtime()
                .doc("Total number of GPUs in the run. Set at launch."),
        ]
    }
}
