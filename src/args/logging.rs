//! Experiment tracking and logging

use super::ArgGroup;
use crate::schema::FieldDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingArgs {
    pub use_wandb: Option<bool>,
    pub wandb_group: Option<String>,
    pub wandb_team: Option<String>,
    pub wandb_project: String,
    pub wandb_host: String,
    pub git_hash: Option<String>,
    pub log_dir: Option<String>,
    pub tensorboard_dir: Option<String>,
    pub log_interval: Option<u64>,
    pub log_param_norm: bool,
    pub log_grad_norm: bool,
    pub log_optimizer_states: bool,
    pub log_gradient_noise_scale: bool,
    pub gradient_noise_scale_n_batches: u64,
    pub gradient_noise_scale_cpu_offload: bool,
}

impl Default for LoggingArgs {
    fn default() -> Self {
        Self {
            use_wandb: None,
            wandb_group: None,
            wandb_team: None,
            wandb_project: "neox".to_string(),
            wandb_host: "https://api.wandb.ai".to_string(),
            git_hash: None,
            log_dir: None,
            tensorboard_dir: None,
            log_interval: None,
            log_param_norm: false,
            log_grad_norm: false,
            log_optimizer_states: false,
            log_gradient_noise_scale: false,
            gradient_noise_scale_n_batches: 5,
            gradient_noise_scale_cpu_offload: false,
        }
    }
}

impl ArgGroup for LoggingArgs {
    const NAME: &'static str = "logging";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::boolean("use_wandb")
                .optional("Weights & Biases logging is off")
                .doc("Log to Weights & Biases."),
            FieldDescriptor::string("wandb_group")
                .optional("runs are not grouped")
                .doc("Weights & Biases group name, used to group runs together."),
            FieldDescriptor::string("wandb_team")
                .optional("runs are logged to the personal account")
                .doc("Team name for Weights & Biases."),
            FieldDescriptor::string("wandb_project")
                .default("neox")
                .doc("Weights & Biases project name."),
            FieldDescriptor::string("wandb_host")
                .default("https://api.wandb.ai")
                .doc("URL of the Weights & Biases host."),
            FieldDescriptor::string("git_hash")
                .optional("the revision has not been queried yet")
                .runtime()
                .doc("Source revision of the training code, or \"unavailable\". Recorded at startup."),
            FieldDescriptor::string("log_dir")
                .optional("logs are not written to disk")
                .doc("Directory to save logs to."),
            FieldDescriptor::string("tensorboard_dir")
                .optional("TensorBoard logging is off")
                .doc("Write TensorBoard logs to this directory."),
            FieldDescriptor::integer("log_interval")
                .optional("the trainer default interval applies")
                .at_least_one()
                .doc("Interval between logging, in iterations."),
            FieldDescriptor::boolean("log_param_norm")
                .default(false)
                .doc("Log the Frobenius norm of the parameters."),
            FieldDescriptor::boolean("log_grad_norm")
                .default(false)
                .doc(
                    "Log the Frobenius norm of the gradients. Only supported with \
                     pipe_parallel_size 0.",
                ),
            FieldDescriptor::boolean("log_optimizer_states")
                .default(false)
                .doc("Log the Frobenius norm of the optimizer states."),
            FieldDescriptor::boolean("log_gradient_noise_scale")
                .default(false)
                .doc("Log the gradient noise scale during training (arXiv:1812.06162)."),
            FieldDescriptor::integer("gradient_noise_scale_n_batches")
                .default(5)
                .at_least_one()
                .doc("Number of batches to accumulate gradients over for the gradient noise scale."),
            FieldDescriptor::boolean("gradient_noise_scale_cpu_offload")
                .default(false)
                .doc("Offload buffered gradients to the CPU while measuring gradient noise scale."),
        ]
    }
}
