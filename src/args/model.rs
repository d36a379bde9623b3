//! Model architecture

use super::attention::AttentionBlock;
use super::ArgGroup;
use crate::schema::{ElementType, FieldDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

choice_enum! {
    /// Training precision
    pub enum Precision {
        Fp16 => "fp16",
        Fp32 => "fp32",
        Bfloat16 => "bfloat16",
    }
}

choice_enum! {
    pub enum Norm {
        LayerNorm => "layernorm",
        RmsNorm => "rmsnorm",
        ScaleNorm => "scalenorm",
    }
}

choice_enum! {
    /// Positional embedding scheme
    pub enum PosEmb {
        Learned => "learned",
        Rotary => "rotary",
        Sinusoidal => "sinusoidal",
        Rpe => "rpe",
        Alibi => "alibi",
        None => "none",
    }
}

choice_enum! {
    /// Ordering of shared layers: for 4 layers over 2 unique ones,
    /// grouped is [1, 2, 1, 2] and spaced is [1, 1, 2, 2]
    pub enum ParamSharingStyle {
        Grouped => "grouped",
        Spaced => "spaced",
    }
}

choice_enum! {
    pub enum Activation {
        Gelu => "gelu",
        Geglu => "geglu",
        Relu => "relu",
        Softsign => "softsign",
        Swish => "swish",
        Mish => "mish",
    }
}

choice_enum! {
    /// Weight initialization function
    pub enum InitMethod {
        Normal => "normal",
        ScaledNormal => "scaled_normal",
        Orthogonal => "orthogonal",
        ScaledOrthogonal => "scaled_orthogonal",
        XavierUniform => "xavier_uniform",
        XavierNormal => "xavier_normal",
        WangInit => "wang_init",
        SmallInit => "small_init",
    }
}

choice_enum! {
    /// Dimension the output layer is split over: hidden (row) or vocab (column)
    pub enum OutputLayerParallelism {
        Row => "row",
        Column => "column",
    }
}

impl Default for Norm {
    fn default() -> Self {
        Norm::LayerNorm
    }
}

impl Default for PosEmb {
    fn default() -> Self {
        PosEmb::Learned
    }
}

impl Default for ParamSharingStyle {
    fn default() -> Self {
        ParamSharingStyle::Grouped
    }
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Gelu
    }
}

impl Default for OutputLayerParallelism {
    fn default() -> Self {
        OutputLayerParallelism::Row
    }
}

/// Soft prompt tuning settings; when present only the soft prompt trains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoftPromptTuning {
    pub enabled: bool,
    /// Length of the soft prompt in tokens
    pub num_tokens: u64,
    /// When non-empty, initialize from the embeddings of this string
    pub init_string: String,
    /// Otherwise initialize uniformly in [-init_range, init_range]
    pub init_range: f64,
}

impl Default for SoftPromptTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            num_tokens: 10,
            init_string: String::new(),
            init_range: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelArgs {
    pub precision: Option<Precision>,
    pub num_layers: Option<u64>,
    pub hidden_size: Option<u64>,
    pub num_attention_heads: Option<u64>,
    pub seq_length: Option<u64>,
    pub max_position_embeddings: Option<u64>,
    pub norm: Norm,
    pub layernorm_epsilon: f64,
    pub rms_norm_epsilon: f64,
    pub scalenorm_epsilon: f64,
    pub pos_emb: PosEmb,
    pub rpe_num_buckets: u64,
    pub rpe_max_distance: u64,
    pub no_weight_tying: bool,
    pub attention_config: Option<Vec<AttentionBlock>>,
    pub sparsity_config: Option<Map<String, Value>>,
    pub num_unique_layers: Option<u64>,
    pub param_sharing_style: ParamSharingStyle,
    pub make_vocab_size_divisible_by: u64,
    pub activation: Activation,
    pub scaled_upper_triang_masked_softmax_fusion: bool,
    pub scaled_masked_softmax_fusion: bool,
    pub bias_gelu_fusion: bool,
    pub bias_dropout_fusion: bool,
    pub fp16_lm_cross_entropy: bool,
    pub init_method_std: f64,
    pub apply_query_key_layer_scaling: bool,
    pub use_cpu_initialization: bool,
    pub attention_softmax_in_fp32: bool,
    pub rotary_pct: f64,
    pub rotary_emb_base: u64,
    pub init_method: InitMethod,
    pub output_layer_init_method: InitMethod,
    pub gmlp_attn_dim: u64,
    pub gpt_j_residual: bool,
    pub soft_prompt_tuning: Option<SoftPromptTuning>,
    pub output_layer_parallelism: OutputLayerParallelism,
}

impl Default for ModelArgs {
    fn default() -> Self {
        Self {
            precision: None,
            num_layers: None,
            hidden_size: None,
            num_attention_heads: None,
            seq_length: None,
            max_position_embeddings: None,
            norm: Norm::default(),
            layernorm_epsilon: 1.0e-5,
            rms_norm_epsilon: 1.0e-8,
            scalenorm_epsilon: 1.0e-8,
            pos_emb: PosEmb::default(),
            rpe_num_buckets: 32,
            rpe_max_distance: 128,
            no_weight_tying: false,
            attention_config: None,
            sparsity_config: None,
            num_unique_layers: None,
            param_sharing_style: ParamSharingStyle::default(),
            make_vocab_size_divisible_by: 128,
            activation: Activation::default(),
            scaled_upper_triang_masked_softmax_fusion: false,
            scaled_masked_softmax_fusion: false,
            bias_gelu_fusion: false,
            bias_dropout_fusion: false,
            fp16_lm_cross_entropy: false,
            init_method_std: 0.02,
            apply_query_key_layer_scaling: false,
            use_cpu_initialization: false,
            attention_softmax_in_fp32: false,
            rotary_pct: 1.0,
            rotary_emb_base: 10000,
            init_method: InitMethod::Normal,
            output_layer_init_method: InitMethod::ScaledNormal,
            gmlp_attn_dim: 64,
            gpt_j_residual: false,
            soft_prompt_tuning: None,
            output_layer_parallelism: OutputLayerParallelism::default(),
        }
    }
}

impl ModelArgs {
    /// Hidden dims per attention head, when both sizes are known
    pub fn head_dim(&self) -> Option<u64> {
        match (self.hidden_size, self.num_attention_heads) {
            (Some(hidden), Some(heads)) if heads > 0 => Some(hidden / heads),
            _ => None,
        }
    }
}

const INIT_DOC: &str = "Choose from normal, scaled_normal, orthogonal, scaled_orthogonal, \
                        xavier_uniform, xavier_normal, wang_init, small_init.";

impl ArgGroup for ModelArgs {
    const NAME: &'static str = "model";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::choice("precision", Precision::VARIANTS)
                .optional("training runs in fp32")
                .doc("Precision used for training: fp16, fp32 or bfloat16."),
            FieldDescriptor::integer("num_layers")
                .required()
                .at_least_one()
                .doc("Number of transformer layers."),
            FieldDescriptor::integer("hidden_size")
                .required()
                .at_least_one()
                .doc("Transformer hidden size."),
            FieldDescriptor::integer("num_attention_heads")
                .required()
                .at_least_one()
                .doc("Number of transformer attention heads."),
            FieldDescriptor::integer("seq_length")
                .required()
                .at_least_one()
                .doc("Maximum sequence length to process."),
            FieldDescriptor::integer("max_position_embeddings")
                .optional("set to seq_length")
                .at_least_one()
                .doc("Maximum number of position embeddings, i.e. the size of the position embedding."),
            FieldDescriptor::choice("norm", Norm::VARIANTS)
                .default("layernorm")
                .doc("Normalization layer to use. Choose from layernorm, rmsnorm, scalenorm."),
            FieldDescriptor::float("layernorm_epsilon")
                .default(1.0e-5)
                .non_negative()
                .doc("Layer norm epsilon."),
            FieldDescriptor::float("rms_norm_epsilon")
                .default(1.0e-8)
                .non_negative()
                .doc("Root mean squared norm epsilon."),
            FieldDescriptor::float("scalenorm_epsilon")
                .default(1.0e-8)
                .non_negative()
                .doc("Scalenorm epsilon."),
            FieldDescriptor::choice("pos_emb", PosEmb::VARIANTS)
                .default("learned")
                .doc("Positional embedding: learned, rotary, sinusoidal, rpe, alibi or none."),
            FieldDescriptor::integer("rpe_num_buckets")
                .default(32)
                .at_least_one()
                .doc("T5 relative positional encoding number of buckets."),
            FieldDescriptor::integer("rpe_max_distance")
                .default(128)
                .at_least_one()
                .doc("T5 relative positional encoding max distance."),
            FieldDescriptor::boolean("no_weight_tying")
                .default(false)
                .doc("Disables weight tying between embedding weights and the final linear layer."),
            FieldDescriptor::list("attention_config", ElementType::Any)
                .optional("every layer uses global attention")
                .doc(
                    "Attention layout as a list of [[types...], repeat] pairs, expanded in order. \
                     [[[\"global\"], 12]] is 12 global layers; [[[\"global\", \"local\"], 6]] \
                     alternates global and local over 12 layers. Types: global, local, \
                     sparse_fixed, sparse_variable, bigbird, bslongformer, gmlp, amlp.",
                ),
            FieldDescriptor::mapping("sparsity_config")
                .optional("sparse attention layers use the default sparsity layout")
                .doc(
                    "Sparse attention settings (block, num_local_blocks, num_global_blocks, \
                     num_random_blocks, ...). Attention is always unidirectional; the sparsity \
                     mode is taken from attention_config rather than from this mapping.",
                ),
            FieldDescriptor::integer("num_unique_layers")
                .optional("every layer has its own parameters")
                .at_least_one()
                .doc(
                    "Number of unique transformer layers; num_layers must be divisible by it. \
                     Only has an effect when pipe_parallel_size is 0.",
                ),
            FieldDescriptor::choice("param_sharing_style", ParamSharingStyle::VARIANTS)
                .default("grouped")
                .doc(
                    "Ordering of shared parameters. With 4 layers and 2 unique layers, grouped \
                     gives [1, 2, 1, 2] and spaced gives [1, 1, 2, 2].",
                ),
            FieldDescriptor::integer("make_vocab_size_divisible_by")
                .default(128)
                .at_least_one()
                .doc("Pad the vocab size to be divisible by this value, for computational efficiency."),
            FieldDescriptor::choice("activation", Activation::VARIANTS)
                .default("gelu")
                .doc("Activation function: gelu, geglu, relu, softsign, swish or mish."),
            FieldDescriptor::boolean("scaled_upper_triang_masked_softmax_fusion")
                .default(false)
                .doc("Fuse query-key scaling, upper-triangular masking and softmax."),
            FieldDescriptor::boolean("scaled_masked_softmax_fusion")
                .default(false)
                .doc("Fuse query-key scaling, general masking and softmax."),
            FieldDescriptor::boolean("bias_gelu_fusion")
                .default(false)
                .doc("Enable bias and gelu fusion."),
            FieldDescriptor::boolean("bias_dropout_fusion")
                .default(false)
                .doc("Enable bias and dropout fusion."),
            FieldDescriptor::boolean("fp16_lm_cross_entropy")
                .default(false)
                .doc("Compute the unreduced LM-head cross entropy loss in fp16."),
            FieldDescriptor::float("init_method_std")
                .default(0.02)
                .non_negative()
                .doc("Standard deviation of the zero-mean normal used for weight initialization."),
            FieldDescriptor::boolean("apply_query_key_layer_scaling")
                .default(false)
                .doc("Scale Q * K^T by 1 / layer-number. Implies attention_softmax_in_fp32."),
            FieldDescriptor::boolean("use_cpu_initialization")
                .default(false)
                .doc("Initialize affine parallel weights on the CPU."),
            FieldDescriptor::boolean("attention_softmax_in_fp32")
                .default(false)
                .doc("Run attention masking and softmax in fp32."),
            FieldDescriptor::float("rotary_pct")
                .default(1.0)
                .bounded(0.0, 1.0)
                .doc("Fraction of hidden dims to apply rotary positional embedding to."),
            FieldDescriptor::integer("rotary_emb_base")
                .default(10000)
                .at_least_one()
                .doc("Base for rotary positional embedding."),
            FieldDescriptor::choice("init_method", InitMethod::VARIANTS)
                .default("normal")
                .doc(format!(
                    "Init function used on all layers except ff residual outputs. {INIT_DOC}"
                )),
            FieldDescriptor::choice("output_layer_init_method", InitMethod::VARIANTS)
                .default("scaled_normal")
                .doc(format!("Init function used for ff residual outputs. {INIT_DOC}")),
            FieldDescriptor::integer("gmlp_attn_dim")
                .default(64)
                .at_least_one()
                .doc("Dimension of the single-head self attention in gMLP models (unused by GPT models)."),
            FieldDescriptor::boolean("gpt_j_residual")
                .default(false)
                .doc(
                    "Use the GPT-J parallel residual x = x + attn(ln(x)) + mlp(ln(x)) instead of \
                     the sequential x = x + attn(ln1(x)); x = x + mlp(ln2(x)).",
                ),
            FieldDescriptor::mapping("soft_prompt_tuning")
                .optional("the whole model is trained")
                .doc(format!(
                    "Soft prompt tuning settings; when enabled only the soft prompt is trained. \
                     Keys and defaults: {}.",
                    json!(SoftPromptTuning::default())
                )),
            FieldDescriptor::choice("output_layer_parallelism", OutputLayerParallelism::VARIANTS)
                .default("row")
                .doc("Parallelize the output layer over the hidden dim (row) or the vocab dim (column)."),
        ]
    }
}
