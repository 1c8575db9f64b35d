//! Embedding model traits and error types.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while loading or running an embedding model.
///
/// Cloneable so that one failed load can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("Failed to load embedding model {model}: {message}")]
    ModelLoad { model: String, message: String },

    #[error("Embedding inference failed: {0}")]
    Inference(String),
}

impl EmbeddingError {
    pub fn model_load(model: impl Into<String>, message: impl ToString) -> Self {
        Self::ModelLoad {
            model: model.into(),
            message: message.to_string(),
        }
    }

    pub fn inference(message: impl ToString) -> Self {
        Self::Inference(message.to_string())
    }
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        Self::Inference(err.to_string())
    }
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// A loaded text-embedding model.
///
/// `embed` is synchronous and CPU bound; callers run it on the blocking
/// pool. Implementations must return mean-pooled, L2-normalized vectors.
pub trait EmbeddingModel: Send + Sync {
    /// Converts one text into a vector.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Output dimension of the model.
    fn dimension(&self) -> usize;
}

/// Shared handle to a loaded model.
pub type ModelHandle = Arc<dyn EmbeddingModel>;

/// Loads model weights, typically from a remote hub or local cache.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Identifier of the model this loader produces.
    fn model_name(&self) -> &str;

    /// Performs the load. Called at most once per successful provider.
    async fn load(&self) -> EmbeddingResult<ModelHandle>;
}
