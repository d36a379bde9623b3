//! Data, checkpointing and the training loop

use super::ArgGroup;
use crate::schema::{ElementType, FieldDescriptor};
use serde::{Deserialize, Serialize};

choice_enum! {
    /// Indexed dataset implementation
    pub enum DataImpl {
        Infer => "infer",
        Mmap => "mmap",
        Cached => "cached",
        Lazy => "lazy",
    }
}

impl Default for DataImpl {
    fn default() -> Self {
        DataImpl::Infer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingArgs {
    pub data_path: Option<String>,
    pub train_data_paths: Option<Vec<String>>,
    pub test_data_paths: Option<Vec<String>>,
    pub valid_data_paths: Option<Vec<String>>,
    pub train_data_weights: Option<Vec<f64>>,
    pub valid_data_weights: Option<Vec<f64>>,
    pub test_data_weights: Option<Vec<f64>>,
    pub weight_by_num_documents: bool,
    pub weighted_sampler_alpha: f64,
    pub data_impl: DataImpl,
    pub mmap_warmup: bool,
    pub save: Option<String>,
    pub load: Option<String>,
    pub checkpoint_validation_with_forward_pass: bool,
    pub save_interval: Option<u64>,
    pub no_save_optim: bool,
    pub no_save_rng: bool,
    pub no_load_optim: bool,
    pub no_load_rng: bool,
    pub finetune: bool,
    pub batch_size: Option<u64>,
    pub train_iters: Option<u64>,
    pub eval_iters: u64,
    pub keep_last_n_checkpoints: Option<u64>,
    pub eval_interval: u64,
    pub split: String,
    pub vocab_file: Option<String>,
    pub merge_file: Option<String>,
    pub num_workers: u64,
    pub exit_interval: Option<u64>,
    pub attention_dropout: f64,
    pub hidden_dropout: f64,
    pub weight_decay: f64,
    pub checkpoint_activations: bool,
    pub checkpoint_num_layers: u64,
    pub deepspeed_activation_checkpointing: bool,
    pub contiguous_checkpointing: bool,
    pub checkpoint_in_cpu: bool,
    pub synchronize_each_layer: bool,
    pub profile_backward: bool,
    pub partition_activations: bool,
    pub gas: Option<u64>,
    pub clip_grad: Option<f64>,
    pub hysteresis: u64,
    pub dynamic_loss_scale: Option<bool>,
    pub loss_scale: Option<f64>,
    pub loss_scale_window: f64,
    pub min_scale: f64,
    pub char_level_ppl: bool,
}

impl Default for TrainingArgs {
    fn default() -> Self {
        Self {
            data_path: None,
            train_data_paths: None,
            test_data_paths: None,
            valid_data_paths: None,
            train_data_weights: None,
            valid_data_weights: None,
            test_data_weights: None,
            weight_by_num_documents: false,
            weighted_sampler_alpha: 0.3,
            data_impl: DataImpl::default(),
            mmap_warmup: false,
            save: None,
            load: None,
            checkpoint_validation_with_forward_pass: false,
            save_interval: None,
            no_save_optim: false,
            no_save_rng: false,
            no_load_optim: false,
            no_load_rng: false,
            finetune: false,
            batch_size: None,
            train_iters: None,
            eval_iters: 100,
            keep_last_n_checkpoints: None,
            eval_interval: 1000,
            split: "969, 30, 1".to_string(),
            vocab_file: None,
            merge_file: None,
            num_workers: 2,
            exit_interval: None,
            attention_dropout: 0.1,
            hidden_dropout: 0.1,
            weight_decay: 0.01,
            checkpoint_activations: false,
            checkpoint_num_layers: 1,
            deepspeed_activation_checkpointing: true,
            contiguous_checkpointing: false,
            checkpoint_in_cpu: false,
            synchronize_each_layer: false,
            profile_backward: false,
            partition_activations: false,
            gas: None,
            clip_grad: None,
            hysteresis: 2,
            dynamic_loss_scale: None,
            loss_scale: None,
            loss_scale_window: 1000.0,
            min_scale: 1.0,
            char_level_ppl: false,
        }
    }
}

impl TrainingArgs {
    /// Dataset blending weights for the training split, equal when unset
    pub fn effective_train_weights(&self) -> Option<Vec<f64>> {
        let paths = self.train_data_paths.as_ref()?;
        Some(
            self.train_data_weights
                .clone()
                .unwrap_or_else(|| vec![1.0; paths.len()]),
        )
    }
}

const WEIGHTS_DOC: &str = "Sampling weights for blending datasets; must have one entry per path. \
                           Equal weighting when unset.";

impl ArgGroup for TrainingArgs {
    const NAME: &'static str = "training";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::string("data_path")
                .optional("train_data_paths is used instead")
                .doc("Path to a combined dataset to split."),
            FieldDescriptor::list("train_data_paths", ElementType::String)
                .optional("data_path is split instead")
                .doc("Paths to training datasets."),
            FieldDescriptor::list("test_data_paths", ElementType::String)
                .optional("data_path is split instead")
                .doc("Paths to test datasets."),
            FieldDescriptor::list("valid_data_paths", ElementType::String)
                .optional("data_path is split instead")
                .doc("Paths to validation datasets."),
            FieldDescriptor::list("train_data_weights", ElementType::Float)
                .optional("training datasets are weighted equally")
                .doc(format!("Training split. {WEIGHTS_DOC}")),
            FieldDescriptor::list("valid_data_weights", ElementType::Float)
                .optional("validation datasets are weighted equally")
                .doc(format!("Validation split. {WEIGHTS_DOC}")),
            FieldDescriptor::list("test_data_weights", ElementType::Float)
                .optional("test datasets are weighted equally")
                .doc(format!("Test split. {WEIGHTS_DOC}")),
            FieldDescriptor::boolean("weight_by_num_documents")
                .default(false)
                .doc(
                    "Build dataset weights from a multinomial over groups, p(L) ∝ |L| ** alpha, \
                     with |L| the number of documents in the group (arXiv:1911.02116). \
                     Overrides any user-provided weights.",
                ),
            FieldDescriptor::float("weighted_sampler_alpha")
                .default(0.3)
                .non_negative()
                .doc(
                    "Alpha for weight_by_num_documents. 1 samples proportionally to size; \
                     towards 0 all groups become equally likely.",
                ),
            FieldDescriptor::choice("data_impl", DataImpl::VARIANTS)
                .default("infer")
                .doc("Implementation of indexed datasets."),
            FieldDescriptor::boolean("mmap_warmup")
                .default(false)
                .doc("Warm up mmap files."),
            FieldDescriptor::string("save")
                .optional("checkpoints are not saved")
                .doc("Output directory to save checkpoints to."),
            FieldDescriptor::string("load")
                .optional("training starts from scratch")
                .doc("Directory containing a model checkpoint."),
            FieldDescriptor::boolean("checkpoint_validation_with_forward_pass")
                .default(false)
                .doc("Save the input and output of a forward pass with the checkpoint and check it on load."),
            FieldDescriptor::integer("save_interval")
                .optional("only the final checkpoint is saved")
                .at_least_one()
                .doc("Number of iterations between checkpoint saves."),
            FieldDescriptor::boolean("no_save_optim")
                .default(false)
                .doc("Do not save the optimizer state."),
            FieldDescriptor::boolean("no_save_rng")
                .default(false)
                .doc("Do not save the RNG state."),
            FieldDescriptor::boolean("no_load_optim")
                .default(false)
                .doc("Do not load the optimizer state from the checkpoint."),
            FieldDescriptor::boolean("no_load_rng")
                .default(false)
                .doc("Do not load the RNG state from the checkpoint."),
            FieldDescriptor::boolean("finetune")
                .default(false)
                .doc(
                    "Load the model for finetuning: skip optimizer and RNG state and reset the \
                     iteration to 0.",
                ),
            FieldDescriptor::integer("batch_size")
                .optional("taken from the engine batch configuration")
                .at_least_one()
                .doc("Training micro-batch size per GPU."),
            FieldDescriptor::integer("train_iters")
                .optional("the trainer runs no fixed number of iterations")
                .at_least_one()
                .doc("Number of iterations to train for."),
            FieldDescriptor::integer("eval_iters")
                .default(100)
                .non_negative()
                .doc("Number of iterations to run validation/test evaluation for."),
            FieldDescriptor::integer("keep_last_n_checkpoints")
                .optional("every checkpoint is kept")
                .at_least_one()
                .doc("Number of most recent checkpoints to keep."),
            FieldDescriptor::integer("eval_interval")
                .default(1000)
                .at_least_one()
                .doc("Interval between evaluations on the validation set."),
            FieldDescriptor::string("split")
                .default("969, 30, 1")
                .doc(
                    "Comma-separated train, validation and test proportions. \"90,5,5\" uses \
                     90% of the data for training, 5% for validation and 5% for test.",
                ),
            FieldDescriptor::string("vocab_file")
                .optional("the tokenizer default vocabulary is used")
                .doc("Path to the vocab file."),
            FieldDescriptor::string("merge_file")
                .optional("the tokenizer default merges are used")
                .doc("Path to the BPE merge file."),
            FieldDescriptor::integer("num_workers")
                .default(2)
                .non_negative()
                .doc("Number of dataloader workers."),
            FieldDescriptor::integer("exit_interval")
                .optional("training runs to completion")
                .at_least_one()
                .doc("Exit once the iteration is divisible by this value."),
            FieldDescriptor::float("attention_dropout")
                .default(0.1)
                .bounded(0.0, 1.0)
                .doc("Post-attention dropout probability."),
            FieldDescriptor::float("hidden_dropout")
                .default(0.1)
                .bounded(0.0, 1.0)
                .doc("Dropout probability for the transformer hidden state."),
            FieldDescriptor::float("weight_decay")
                .default(0.01)
                .non_negative()
                .doc("Weight decay coefficient for L2 regularization."),
            FieldDescriptor::boolean("checkpoint_activations")
                .default(false)
                .doc("Checkpoint activations to fit larger models, sequences and batches."),
            FieldDescriptor::integer("checkpoint_num_layers")
                .default(1)
                .at_least_one()
                .doc("Chunk size (number of layers) for activation checkpointing."),
            FieldDescriptor::boolean("deepspeed_activation_checkpointing")
                .default(true)
                .doc("Deprecated. Use DeepSpeed activation checkpointing."),
            FieldDescriptor::boolean("contiguous_checkpointing")
                .default(false)
                .doc("Contiguous memory checkpointing for activations."),
            FieldDescriptor::boolean("checkpoint_in_cpu")
                .default(false)
                .doc("Move activation checkpoints to the CPU."),
            FieldDescriptor::boolean("synchronize_each_layer")
                .default(false)
                .doc("Synchronize at the beginning and end of each checkpointed layer."),
            FieldDescriptor::boolean("profile_backward")
                .default(false)
                .doc("Profile the backward pass of checkpointed layers."),
            FieldDescriptor::boolean("partition_activations")
                .default(false)
                .doc("Partition activations across GPUs before checkpointing."),
            FieldDescriptor::integer("gas")
                .optional("no gradient accumulation")
                .at_least_one()
                .doc("Gradient accumulation steps."),
            FieldDescriptor::float("clip_grad")
                .optional("gradients are not clipped")
                .non_negative()
                .doc("Gradient clipping based on the global L2 norm."),
            FieldDescriptor::integer("hysteresis")
                .default(2)
                .non_negative()
                .doc("Hysteresis for dynamic loss scaling."),
            FieldDescriptor::boolean("dynamic_loss_scale")
                .optional("derived from loss_scale")
                .derived()
                .doc("Whether dynamic loss scaling is used. Computed from loss_scale."),
            FieldDescriptor::float("loss_scale")
                .optional("dynamic loss scaling is used")
                .doc("Static loss scale. Positive powers of two can improve fp16 convergence."),
            FieldDescriptor::float("loss_scale_window")
                .default(1000.0)
                .non_negative()
                .doc("Window over which to raise or lower the dynamic loss scale."),
            FieldDescriptor::float("min_scale")
                .default(1.0)
                .non_negative()
                .doc("Minimum loss scale for dynamic loss scaling."),
            FieldDescriptor::boolean("char_level_ppl")
                .default(false)
                .doc("Also compute character-level perplexity. May cost time."),
        ]
    }
}
