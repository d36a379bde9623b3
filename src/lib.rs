//! # neox-args: Training Configuration for GPT-NeoX Style Models
//!
//! neox-args composes a single validated parameter namespace out of typed
//! parameter groups, each declared once with its defaults, allowed values,
//! mutability and documentation.
//!
//! ## Architecture
//!
//! - **schema**: Field descriptors and parameter groups
//! - **args**: The NeoX parameter groups and derived-value finalization
//! - **config**: Merging, YAML loading, documentation and CLI parsing
//! - **validate**: Cross-field consistency rules
//! - **runtime**: Launch-time facts and live runtime handles
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//!
//! let overrides = json!({
//!     "num_layers": 2,
//!     "hidden_size": 64,
//!     "num_attention_heads": 4,
//!     "seq_length": 128,
//!     "lr": 0.0006,
//! });
//! let mut config = neox_args::args::from_flat(overrides.as_object().cloned().unwrap()).unwrap();
//! neox_args::args::finalize(&mut config).unwrap();
//! config.validate().unwrap();
//!
//! assert_eq!(config.unsigned("max_position_embeddings"), Some(128));
//! ```

pub mod args;
pub mod config;
pub mod runtime;
pub mod schema;
pub mod validate;

pub mod error;

pub use args::NeoXArgs;
pub use config::MergedConfig;
pub use error::{Error, Result};
