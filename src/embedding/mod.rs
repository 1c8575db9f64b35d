//! Text embeddings for semantic search.
//!
//! This module turns query text into vectors locally, using Candle to run
//! sentence-transformer models fetched from the Hugging Face hub.
//!
//! # Architecture
//!
//! - [`EmbeddingProvider`] - Owns the shared model; loads it once, on demand
//! - [`BertLoader`] - Fetches and builds a BERT model ([`ModelLoader`] impl)
//! - [`Embedding`] - A vector representation of text semantics
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vector_view::embedding::{BertLoader, EmbeddingProvider};
//!
//! let loader = BertLoader::new("sentence-transformers/all-MiniLM-L6-v2", "main");
//! let provider = EmbeddingProvider::new(Arc::new(loader));
//!
//! let query = provider.embed("how do I rotate an API key").await?;
//! assert_eq!(query.dimension(), 384);
//! ```

mod bert;
mod engine;
mod models;
mod traits;
mod vector;

pub use bert::{l2_normalize, mean_pool, BertEmbedder, BertLoader};
pub use engine::{EmbeddingProvider, ModelStatus};
pub use models::ModelType;
pub use traits::{EmbeddingError, EmbeddingModel, EmbeddingResult, ModelHandle, ModelLoader};
pub use vector::{random_vector, Embedding};
