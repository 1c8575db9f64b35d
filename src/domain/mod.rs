//! Domain types for the vector store.
//!
//! Plain data types that mirror the store's JSON resources, plus the scoping
//! and identifier types used across the crate.

mod catalog;
mod query;
mod records;
mod types;

pub use catalog::{Collection, Database, Metadata, NewCollection, Tenant, UserIdentity};
pub use query::{QueryEmbeddings, QueryHit, QueryRequest, QueryResponse, DEFAULT_QUERY_LIMIT};
pub use records::{AddRecords, GetRequest, GetResponse, Include, Record};
pub use types::{CollectionId, DatabaseRef, Pagination, DEFAULT_DATABASE, DEFAULT_TENANT};
