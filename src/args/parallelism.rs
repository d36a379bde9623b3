//! Parallelism topology

use super::ArgGroup;
use crate::schema::FieldDescriptor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelismArgs {
    pub pipe_parallel_size: u64,
    pub model_parallel_size: u64,
    pub pipe_partition_method: String,
    pub world_size: Option<u64>,
    pub is_pipe_parallel: bool,
}

impl Default for ParallelismArgs {
    fn default() -> Self {
        Self {
            pipe_parallel_size: 0,
            model_parallel_size: 1,
            pipe_partition_method: "type:transformer|mlp".to_string(),
            world_size: None,
            is_pipe_parallel: false,
        }
    }
}

impl ParallelismArgs {
    /// Pipeline stages, counting "disabled" (0) as one stage
    pub fn pipe_stages(&self) -> u64 {
        self.pipe_parallel_size.max(1)
    }

    /// Data-parallel degree, once the world size is known
    pub fn data_parallel_size(&self) -> Option<u64> {
        let per_replica = self.pipe_stages().checked_mul(self.model_parallel_size)?;
        self.world_size
            .filter(|_| per_replica > 0)
            .map(|world| world / per_replica)
    }
}

impl ArgGroup for ParallelismArgs {
    const NAME: &'static str = "parallelism";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::integer("pipe_parallel_size")
                .default(0)
                .non_negative()
                .doc("Number of pipeline parallel stages. Disable with 0."),
            FieldDescriptor::integer("model_parallel_size")
                .default(1)
                .at_least_one()
                .doc("Size of the model parallelism."),
            FieldDescriptor::string("pipe_partition_method")
                .default("type:transformer|mlp")
                .doc(
                    "Method used to distribute model layers across pipeline stages: \"parameters\" \
                     balances the number of parameters per stage, \"uniform\" balances the number \
                     of layers per stage, \"type:[regex]\" balances layers whose class names match \
                     [regex].",
                ),
            FieldDescriptor::integer("world_size")
                .optional("discovered from the distributed launcher")
                .at_least_one()
                .runtime()
                .doc("Total world size (number of GPUs in the cluster). Configured post-launch."),
            FieldDescriptor::boolean("is_pipe_parallel")
                .default(false)
                .derived()
                .doc(
                    "Whether pipeline parallelism is on. Computed from pipe_parallel_size; \
                     not meant to be set by users.",
                ),
        ]
    }
}
