//! Vector store trait and error types.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    AddRecords, Collection, CollectionId, Database, DatabaseRef, GetRequest, GetResponse,
    NewCollection, Pagination, QueryEmbeddings, QueryResponse, Tenant, UserIdentity,
};

/// Errors that can occur while talking to the vector store.
///
/// Every request variant names the operation and the resource it targeted
/// (`tenant`, `tenant/database` or `tenant/database/collection`).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} {target}: request failed: {source}")]
    Http {
        operation: &'static str,
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} {target}: request timed out")]
    Timeout {
        operation: &'static str,
        target: String,
    },

    #[error("{operation} {target}: HTTP {status}: {message}")]
    Api {
        operation: &'static str,
        target: String,
        status: u16,
        /// Error class reported by the store, e.g. `NotFoundError`.
        kind: Option<String>,
        message: String,
    },

    #[error("{operation} {target}: invalid response: {message}")]
    InvalidResponse {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("Invalid store URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Result type for vector store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Name of the failed operation, if the error came from a request.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Http { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::Api { operation, .. }
            | Self::InvalidResponse { operation, .. } => Some(*operation),
            Self::InvalidUrl { .. } => None,
        }
    }

    /// Resource the failed request targeted.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Http { target, .. }
            | Self::Timeout { target, .. }
            | Self::Api { target, .. }
            | Self::InvalidResponse { target, .. } => Some(target.as_str()),
            Self::InvalidUrl { .. } => None,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The store rejected the request: unknown tenant, bad collection, and so on.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status(), Some(400..=499))
    }

    /// The store could not be reached or failed internally.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Timeout { .. } | Self::InvalidResponse { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::InvalidUrl { .. } => false,
        }
    }
}

/// REST surface of a Chroma-compatible vector store.
///
/// Operations map one-to-one onto API endpoints and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Server heartbeat in nanoseconds.
    async fn heartbeat(&self) -> StoreResult<u64>;

    /// Identity of the authenticated caller.
    async fn identity(&self) -> StoreResult<UserIdentity>;

    async fn get_tenant(&self, tenant: &str) -> StoreResult<Tenant>;

    async fn list_databases(&self, tenant: &str) -> StoreResult<Vec<Database>>;

    async fn get_database(&self, db: &DatabaseRef) -> StoreResult<Database>;

    async fn list_collections(
        &self,
        db: &DatabaseRef,
        page: Pagination,
    ) -> StoreResult<Vec<Collection>>;

    async fn get_collection(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
    ) -> StoreResult<Collection>;

    /// Number of records in a collection.
    async fn count(&self, db: &DatabaseRef, collection: &CollectionId) -> StoreResult<usize>;

    async fn create_collection(
        &self,
        db: &DatabaseRef,
        collection: &NewCollection,
    ) -> StoreResult<Collection>;

    async fn delete_collection(&self, db: &DatabaseRef, collection: &CollectionId)
        -> StoreResult<()>;

    async fn get_documents(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        request: &GetRequest,
    ) -> StoreResult<GetResponse>;

    async fn add_documents(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        records: &AddRecords,
    ) -> StoreResult<()>;

    /// Nearest-neighbour query by embedding.
    async fn query(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        request: &QueryEmbeddings,
    ) -> StoreResult<QueryResponse>;
}
