//! NeoX parameter groups
//!
//! Each group is a typed record (for attribute-style access by training
//! code) plus a declaration table of [`FieldDescriptor`]s (for merging,
//! validation and documentation). The two are kept in agreement by tests.
//!
//! Group order is fixed and is also the merge/export order:
//! `parallelism`, `model`, `optimizer`, `lr_scheduler`, `logging`, `other`,
//! `tokenizer`, `training`, `text_generation`.

/// A string-valued enumerated choice with its legal values as `VARIANTS`
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const VARIANTS: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(
                        "Unknown {} '{}'. Valid options: {}",
                        stringify!($name),
                        s,
                        Self::VARIANTS.join(", ")
                    )),
                }
            }
        }
    };
}

mod attention;
mod finalize;
mod logging;
mod model;
mod optimizer;
mod other;
mod parallelism;
mod scheduler;
mod textgen;
mod tokenizer;
mod training;


pub use attention::{expand_attention_config, AttentionBlock, AttentionType};
pub use finalize::finalize;
pub use logging::LoggingArgs;
pub use model::{
    Activation, InitMethod, ModelArgs, Norm, OutputLayerParallelism, ParamSharingStyle, PosEmb,
    Precision, SoftPromptTuning,
};
pub use optimizer::{OptimizerArgs, OptimizerType};
pub use other::OtherArgs;
pub use parallelism::ParallelismArgs;
pub use scheduler::{LrDecayStyle, LrSchedulerArgs};
pub use textgen::{TextGenType, TextgenArgs};
pub use tokenizer::{TokenizerArgs, TokenizerType};
pub use training::{DataImpl, TrainingArgs};

use crate::config::{ConfigBuilder, MergedConfig};
use crate::error::{Error, Result};
use crate::schema::{FieldDescriptor, GroupSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A typed parameter group with its declaration table
pub trait ArgGroup: Serialize + DeserializeOwned + Default {
    /// Group name used in errors, docs and per-group overrides
    const NAME: &'static str;

    /// Field declarations in declaration order
    fn fields() -> Vec<FieldDescriptor>;

    fn schema() -> Result<GroupSchema> {
        GroupSchema::new(Self::NAME, Self::fields())
    }

    /// Read this group's slice of a merged configuration
    fn from_config(config: &MergedConfig) -> Result<Self> {
        let map = config
            .group_map(Self::NAME)
            .ok_or_else(|| Error::UnknownGroup(Self::NAME.to_string()))?;
        serde_json::from_value(Value::Object(map))
            .map_err(|e| Error::Parse(format!("group '{}': {}", Self::NAME, e)))
    }
}

/// Schemas of every NeoX group, in merge order
pub fn schemas() -> Result<Vec<GroupSchema>> {
    Ok(vec![
        ParallelismArgs::schema()?,
        ModelArgs::schema()?,
        OptimizerArgs::schema()?,
        LrSchedulerArgs::schema()?,
        LoggingArgs::schema()?,
        OtherArgs::schema()?,
        TokenizerArgs::schema()?,
        TrainingArgs::schema()?,
        TextgenArgs::schema()?,
    ])
}

/// Builder over every NeoX group
pub fn builder() -> Result<ConfigBuilder> {
    Ok(ConfigBuilder::new(schemas()?))
}

/// Merged configuration holding every default
pub fn defaults() -> Result<MergedConfig> {
    builder()?.build()
}

/// Merged configuration from a flat override mapping
pub fn from_flat(overrides: Map<String, Value>) -> Result<MergedConfig> {
    builder()?.with_flat(overrides).build()
}

/// Typed view of a NeoX configuration
///
/// ```
/// use neox_args::args::{self, NeoXArgs, Norm};
/// use serde_json::json;
///
/// let overrides = json!({"num_layers": 2, "norm": "rmsnorm"});
/// let config = args::from_flat(overrides.as_object().unwrap().clone())?;
/// let typed = NeoXArgs::from_config(&config)?;
/// assert_eq!(typed.model.num_layers, Some(2));
/// assert_eq!(typed.model.norm, Norm::RmsNorm);
/// # Ok::<(), neox_args::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NeoXArgs {
    #[serde(flatten)]
    pub parallelism: ParallelismArgs,
    #[serde(flatten)]
    pub model: ModelArgs,
    #[serde(flatten)]
    pub optimizer: OptimizerArgs,
    #[serde(flatten)]
    pub lr_scheduler: LrSchedulerArgs,
    #[serde(flatten)]
    pub logging: LoggingArgs,
    #[serde(flatten)]
    pub other: OtherArgs,
    #[serde(flatten)]
    pub tokenizer: TokenizerArgs,
    #[serde(flatten)]
    pub training: TrainingArgs,
    #[serde(flatten)]
    pub textgen: TextgenArgs,
}

impl NeoXArgs {
    pub fn from_config(config: &MergedConfig) -> Result<Self> {
        Ok(Self {
            parallelism: group(config)?,
            model: group(config)?,
            optimizer: group(config)?,
            lr_scheduler: group(config)?,
            logging: group(config)?,
            other: group(config)?,
            tokenizer: group(config)?,
            training: group(config)?,
            textgen: group(config)?,
        })
    }

    /// Flat mapping in merge order
    pub fn to_flat_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(Error::Parse("typed arguments did not serialize to a mapping".into())),
            Err(e) => Err(Error::Parse(e.to_string())),
        }
    }
}

fn group<T: ArgGroup>(config: &MergedConfig) -> Result<T> {
    T::from_config(config)
}
