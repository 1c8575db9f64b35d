//! Chroma v2 REST client.
//!
//! Works with Chroma servers and any store exposing the same `/api/v2`
//! surface.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::traits::{StoreError, StoreResult, VectorStore};
use crate::config::ApiSettings;
use crate::domain::{
    AddRecords, Collection, CollectionId, Database, DatabaseRef, GetRequest, GetResponse,
    NewCollection, Pagination, QueryEmbeddings, QueryResponse, Tenant, UserIdentity,
};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Chroma error body, e.g. `{"error": "NotFoundError", "message": "..."}`.
#[derive(Debug, Deserialize)]
struct ChromaError {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Heartbeat {
    #[serde(rename = "nanosecond heartbeat")]
    nanoseconds: u64,
}

/// Client for a Chroma-compatible `/api/v2` endpoint.
///
/// Every request carries `Content-Type: application/json` and is bounded by
/// the client timeout. Non-2xx responses become [`StoreError::Api`].
#[derive(Debug, Clone)]
pub struct ChromaClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ChromaClient {
    /// Creates a client for `base_url`, e.g. `http://localhost:8000/api/v2`.
    pub fn new(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| StoreError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidUrl {
                url: base_url.to_string(),
                message: "not a hierarchical URL".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(Self::build_headers())
            .build()
            .map_err(|source| StoreError::Http {
                operation: "build client",
                target: base_url.to_string(),
                source,
            })?;

        Ok(Self { client, base_url })
    }

    /// Creates a client for a local server with the default timeout.
    pub fn local() -> StoreResult<Self> {
        Self::new(&ApiSettings::default().base_url, DEFAULT_TIMEOUT)
    }

    pub fn from_settings(settings: &ApiSettings) -> StoreResult<Self> {
        Self::new(&settings.base_url, settings.timeout())
    }

    /// Overrides the HTTP client (useful for custom proxies or TLS roots).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidUrl {
                url: self.base_url.to_string(),
                message: "not a hierarchical URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn database_endpoint(&self, db: &DatabaseRef, rest: &[&str]) -> StoreResult<Url> {
        let mut segments = vec!["tenants", db.tenant.as_str(), "databases", db.database.as_str()];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    fn collection_endpoint(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        rest: &[&str],
    ) -> StoreResult<Url> {
        let mut segments = vec!["collections", collection.as_ref()];
        segments.extend_from_slice(rest);
        self.database_endpoint(db, &segments)
    }

    /// Sends a request and checks its status.
    async fn send(
        &self,
        operation: &'static str,
        target: &str,
        request: RequestBuilder,
    ) -> StoreResult<Response> {
        let response = request.send().await.map_err(|source| {
            if source.is_timeout() {
                StoreError::Timeout {
                    operation,
                    target: target.to_string(),
                }
            } else {
                StoreError::Http {
                    operation,
                    target: target.to_string(),
                    source,
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(operation, target, response).await);
        }
        Ok(response)
    }

    async fn handle_error_response(
        operation: &'static str,
        target: &str,
        response: Response,
    ) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        let (kind, message) = match serde_json::from_str::<ChromaError>(&body) {
            Ok(ChromaError { error, message }) => {
                let message = message.or_else(|| error.clone());
                (error, message)
            }
            Err(_) => (None, None),
        };
        let message = message
            .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            .unwrap_or_else(|| format!("HTTP {}", status));

        tracing::debug!(operation, resource = target, status, message = %message, "Store request rejected");
        StoreError::Api {
            operation,
            target: target.to_string(),
            status,
            kind,
            message,
        }
    }

    /// Sends a request and decodes the JSON body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        target: &str,
        request: RequestBuilder,
    ) -> StoreResult<T> {
        let response = self.send(operation, target, request).await?;
        let bytes = response.bytes().await.map_err(|source| StoreError::Http {
            operation,
            target: target.to_string(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|e| StoreError::InvalidResponse {
            operation,
            target: target.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(%method, %url, "Store request");
        self.client.request(method, url)
    }
}

#[async_trait]
impl VectorStore for ChromaClient {
    async fn heartbeat(&self) -> StoreResult<u64> {
        let url = self.endpoint(&["heartbeat"])?;
        let target = self.base_url.to_string();
        let beat: Heartbeat = self
            .fetch("heartbeat", &target, self.request(Method::GET, url))
            .await?;
        Ok(beat.nanoseconds)
    }

    async fn identity(&self) -> StoreResult<UserIdentity> {
        let url = self.endpoint(&["auth", "identity"])?;
        let target = self.base_url.to_string();
        self.fetch("get identity", &target, self.request(Method::GET, url))
            .await
    }

    async fn get_tenant(&self, tenant: &str) -> StoreResult<Tenant> {
        let url = self.endpoint(&["tenants", tenant])?;
        self.fetch("get tenant", tenant, self.request(Method::GET, url))
            .await
    }

    async fn list_databases(&self, tenant: &str) -> StoreResult<Vec<Database>> {
        let url = self.endpoint(&["tenants", tenant, "databases"])?;
        self.fetch("list databases", tenant, self.request(Method::GET, url))
            .await
    }

    async fn get_database(&self, db: &DatabaseRef) -> StoreResult<Database> {
        let url = self.database_endpoint(db, &[])?;
        self.fetch("get database", &db.to_string(), self.request(Method::GET, url))
            .await
    }

    async fn list_collections(
        &self,
        db: &DatabaseRef,
        page: Pagination,
    ) -> StoreResult<Vec<Collection>> {
        let mut url = self.database_endpoint(db, &["collections"])?;
        url.query_pairs_mut()
            .append_pair("limit", &page.limit.to_string())
            .append_pair("offset", &page.offset.to_string());

        self.fetch(
            "list collections",
            &db.to_string(),
            self.request(Method::GET, url),
        )
        .await
    }

    async fn get_collection(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
    ) -> StoreResult<Collection> {
        let url = self.collection_endpoint(db, collection, &[])?;
        self.fetch(
            "get collection",
            &db.describe(collection),
            self.request(Method::GET, url),
        )
        .await
    }

    async fn count(&self, db: &DatabaseRef, collection: &CollectionId) -> StoreResult<usize> {
        let url = self.collection_endpoint(db, collection, &["count"])?;
        self.fetch(
            "count records",
            &db.describe(collection),
            self.request(Method::GET, url),
        )
        .await
    }

    async fn create_collection(
        &self,
        db: &DatabaseRef,
        collection: &NewCollection,
    ) -> StoreResult<Collection> {
        let url = self.database_endpoint(db, &["collections"])?;
        let target = format!("{}/{}", db, collection.name);
        let created: Collection = self
            .fetch(
                "create collection",
                &target,
                self.request(Method::POST, url).json(collection),
            )
            .await?;

        tracing::info!(collection = %created.id, name = %created.name, "Created collection");
        Ok(created)
    }

    async fn delete_collection(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
    ) -> StoreResult<()> {
        let url = self.collection_endpoint(db, collection, &[])?;
        let target = db.describe(collection);
        self.send(
            "delete collection",
            &target,
            self.request(Method::DELETE, url),
        )
        .await?;

        tracing::info!(collection = %target, "Deleted collection");
        Ok(())
    }

    async fn get_documents(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        request: &GetRequest,
    ) -> StoreResult<GetResponse> {
        let url = self.collection_endpoint(db, collection, &["get"])?;
        self.fetch(
            "get documents",
            &db.describe(collection),
            self.request(Method::POST, url).json(request),
        )
        .await
    }

    async fn add_documents(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        records: &AddRecords,
    ) -> StoreResult<()> {
        let url = self.collection_endpoint(db, collection, &["add"])?;
        self.send(
            "add documents",
            &db.describe(collection),
            self.request(Method::POST, url).json(records),
        )
        .await?;
        Ok(())
    }

    async fn query(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        request: &QueryEmbeddings,
    ) -> StoreResult<QueryResponse> {
        let url = self.collection_endpoint(db, collection, &["query"])?;
        self.fetch(
            "query",
            &db.describe(collection),
            self.request(Method::POST, url).json(request),
        )
        .await
    }
}
