//! Tokenizer selection

use super::ArgGroup;
use crate::schema::FieldDescriptor;
use serde::{Deserialize, Serialize};

choice_enum! {
    pub enum TokenizerType {
        Gpt2Bpe => "GPT2BPETokenizer",
        Hf => "HFTokenizer",
        HfGpt2 => "HFGPT2Tokenizer",
        CharLevel => "CharLevelTokenizer",
    }
}

impl Default for TokenizerType {
    fn default() -> Self {
        TokenizerType::Gpt2Bpe
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenizerArgs {
    pub tokenizer_type: TokenizerType,
    pub padded_vocab_size: Option<u64>,
}

impl ArgGroup for TokenizerArgs {
    const NAME: &'static str = "tokenizer";

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::choice("tokenizer_type", TokenizerType::VARIANTS)
                .default("GPT2BPETokenizer")
                .doc(
                    "Type of tokenizer to use: GPT2BPETokenizer, HFTokenizer, HFGPT2Tokenizer \
                     or CharLevelTokenizer.",
                ),
            FieldDescriptor::integer("padded_vocab_size")
                .optional("the tokenizer has not been loaded")
                .at_least_one()
                .runtime()
                .doc(
                    "Vocabulary size after padding. Set once the tokenizer is loaded, since it \
                     depends on the model parallel size.",
                ),
        ]
    }
}
