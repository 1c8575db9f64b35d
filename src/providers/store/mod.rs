//! Vector store provider.
//!
//! A unified interface over the Chroma-compatible REST API. Services depend
//! on the [`VectorStore`] trait so they can be tested against mocks.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vector_view::domain::{DatabaseRef, Pagination};
//! use vector_view::providers::store::{ChromaClient, VectorStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ChromaClient::new("http://localhost:8000/api/v2", Duration::from_secs(10))?;
//!
//! let db = DatabaseRef::default();
//! for collection in store.list_collections(&db, Pagination::default()).await? {
//!     println!("{} ({})", collection.name, collection.id);
//! }
//! # Ok(())
//! # }
//! ```

mod chroma;
mod traits;

pub use chroma::ChromaClient;
#[cfg(test)]
pub use traits::MockVectorStore;
pub use traits::{StoreError, StoreResult, VectorStore};
