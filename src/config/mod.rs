//! Configuration composition
//!
//! Parameter groups are constructed from user overrides and merged into a
//! single flat namespace. Overrides usually come from YAML files:
//!
//! ```yaml
//! # configs/125M.yml
//! pipe-parallel-size: 1
//! model-parallel-size: 1
//!
//! num-layers: 12
//! hidden-size: 768
//! num-attention-heads: 12
//! seq-length: 2048
//! pos-emb: rotary
//! norm: layernorm
//!
//! optimizer-type: adam
//! lr: 0.0006
//! zero-stage: 0
//!
//! split: "949, 50, 1"
//! train-iters: 320000
//! ```
//!
//! Keys use either `-` or `_`. Several files may be combined as long as no
//! key appears in more than one of them.

mod builder;
mod cli;
mod docs;
mod load;
mod merged;
mod table;

#[cfg(test)]
mod tests;


pub use builder::ConfigBuilder;
pub use cli::{
    parse_args, Cli, Command, DefaultsArgs, DocFormat, DocsArgs, ExportArgs, OutputFormat,
    ValidateArgs,
};
pub use docs::{document_schemas, render_json, render_markdown, render_text, FieldDoc};
pub use load::{load_config, load_config_files, load_overrides, normalize_key, parse_assignment};
pub use merged::{merge, MergedConfig};
pub use table::Table;
