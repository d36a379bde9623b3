//! Attention type registry and `attention_config` expansion

use serde::{Deserialize, Serialize};

choice_enum! {
    /// Attention variant used by a single transformer layer
    pub enum AttentionType {
        Global => "global",
        Local => "local",
        SparseFixed => "sparse_fixed",
        SparseVariable => "sparse_variable",
        BigBird => "bigbird",
        BsLongformer => "bslongformer",
        Gmlp => "gmlp",
        Amlp => "amlp",
    }
}

impl AttentionType {
    /// Variants that read `sparsity_config`
    pub fn is_sparse(&self) -> bool {
        matches!(
            self,
            AttentionType::SparseFixed
                | AttentionType::SparseVariable
                | AttentionType::BigBird
                | AttentionType::BsLongformer
        )
    }
}

/// One `[[types...], repeat]` entry of `attention_config`
///
/// `[["global", "local"], 6]` describes 12 layers alternating global and
/// local attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionBlock(pub Vec<AttentionType>, pub u64);

impl AttentionBlock {
    /// Number of layers this block covers, `None` on overflow
    pub fn layers(&self) -> Option<u64> {
        (self.0.len() as u64).checked_mul(self.1)
    }
}

/// Expand blocks into one attention type per layer
pub fn expand_attention_config(blocks: &[AttentionBlock]) -> Vec<AttentionType> {
    blocks
        .iter()
        .flat_map(|AttentionBlock(types, repeat)| {
            (0..*repeat).flat_map(move |_| types.iter().copied())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_alternating() {
        let blocks = vec![AttentionBlock(
            vec![AttentionType::Global, AttentionType::Local],
            2,
        )];
        assert_eq!(
            expand_attention_config(&blocks),
            vec![
                AttentionType::Global,
                AttentionType::Local,
                AttentionType::Global,
                AttentionType::Local
            ]
        );
        assert_eq!(blocks[0].layers(), Some(4));
        let huge = AttentionBlock(vec![AttentionType::Global, AttentionType::Local], u64::MAX);
        assert_eq!(huge.layers(), None);
    }

    #[test]
    fn test_block_wire_format() {
        let block: AttentionBlock = serde_json::from_str(r#"[["global", "sparse_fixed"], 3]"#).unwrap();
        assert_eq!(block.1, 3);
        assert!(block.0[1].is_sparse());
        assert_eq!(
            serde_json::to_string(&block).unwrap(),
            r#"[["global","sparse_fixed"],3]"#
        );
    }

    #[test]
    fn test_registry_parse() {
        assert_eq!("bigbird".parse::<AttentionType>(), Ok(AttentionType::BigBird));
        assert!("dense".parse::<AttentionType>().is_err());
        assert!(!AttentionType::Gmlp.is_sparse());
    }
}
