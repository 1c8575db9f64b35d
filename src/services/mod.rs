//! Business services layer.
//!
//! Services sit between the command layer and the providers:
//!
//! ```text
//! Application Layer (CLI commands)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Infrastructure (Vector store, Embedding model)
//! ```
//!
//! # Services Overview
//!
//! - [`SearchOrchestrator`]: Text search with a single random-vector fallback
//! - [`CatalogService`]: Collection listings, document pages and vector points

mod catalog_service;
mod search_service;

pub use catalog_service::{
    CatalogError, CatalogResult, CatalogService, CollectionSummary, DocumentPage, VectorPoint,
};
pub use search_service::{
    Attempt, PrimaryFailure, SearchError, SearchOrchestrator, SearchOutcome, SearchResult,
};
