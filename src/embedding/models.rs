//! Known embedding models.
//!
//! Sentence-transformer models that run on the BERT backend. Any other hub
//! id can still be configured; it then gets the generic defaults.

use serde::{Deserialize, Serialize};

/// Available embedding model types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// All-MiniLM-L6-v2 - balanced speed and quality, English.
    #[default]
    AllMiniLmL6V2,
    /// Paraphrase multilingual MiniLM-L12-v2 - 50+ languages.
    ParaphraseMultilingualMiniLmL12V2,
    /// BGE-Small - optimized for retrieval tasks.
    BgeSmall,
    /// E5-Small - good for asymmetric search.
    E5Small,
}

impl ModelType {
    pub const ALL: [ModelType; 4] = [
        Self::AllMiniLmL6V2,
        Self::ParaphraseMultilingualMiniLmL12V2,
        Self::BgeSmall,
        Self::E5Small,
    ];

    /// Returns the Hugging Face model ID.
    pub fn hf_model_id(&self) -> &'static str {
        match self {
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::ParaphraseMultilingualMiniLmL12V2 => {
                "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
            }
            Self::BgeSmall => "BAAI/bge-small-en-v1.5",
            Self::E5Small => "intfloat/e5-small-v2",
        }
    }

    /// Looks up a known model by hub id. Accepts the `Xenova/` mirrors too.
    pub fn from_hf_id(id: &str) -> Option<Self> {
        let name = id.rsplit('/').next().unwrap_or(id);
        Self::ALL
            .into_iter()
            .find(|m| m.hf_model_id().rsplit('/').next() == Some(name))
    }

    /// Returns the expected embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        384
    }

    /// Returns the maximum sequence length.
    pub fn max_seq_length(&self) -> usize {
        match self {
            Self::AllMiniLmL6V2 => 256,
            Self::ParaphraseMultilingualMiniLmL12V2 => 128,
            Self::BgeSmall => 512,
            Self::E5Small => 512,
        }
    }

    /// Returns the query prefix if required.
    pub fn query_prefix(&self) -> Option<&'static str> {
        match self {
            Self::E5Small => Some("query: "),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_type_properties() {
        let model = ModelType::AllMiniLmL6V2;
        assert_eq!(model.embedding_dim(), 384);
        assert_eq!(model.max_seq_length(), 256);
        assert!(model.query_prefix().is_none());
    }

    #[test]
    fn e5_model_prefix() {
        assert_eq!(ModelType::E5Small.query_prefix(), Some("query: "));
    }

    #[test]
    fn lookup_by_hub_id() {
        assert_eq!(
            ModelType::from_hf_id("sentence-transformers/all-MiniLM-L6-v2"),
            Some(ModelType::AllMiniLmL6V2)
        );
        assert_eq!(
            ModelType::from_hf_id("Xenova/all-MiniLM-L6-v2"),
            Some(ModelType::AllMiniLmL6V2)
        );
        assert_eq!(
            ModelType::from_hf_id("sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"),
            Some(ModelType::ParaphraseMultilingualMiniLmL12V2)
        );
        assert_eq!(ModelType::from_hf_id("someone/custom-model"), None);
    }

    #[test]
    fn default_model() {
        assert_eq!(ModelType::default(), ModelType::AllMiniLmL6V2);
    }

    #[test]
    fn model_serialization() {
        let json = serde_json::to_string(&ModelType::BgeSmall).unwrap();
        assert_eq!(json, "\"bge_small\"");

        let deserialized: ModelType = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, ModelType::BgeSmall);
    }
}
