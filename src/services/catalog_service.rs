//! Browsing views over the vector store.
//!
//! Builds the listings a browser needs on top of the raw store API:
//! collections with record counts, paged documents and 2-D vector points.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    Collection, CollectionId, DatabaseRef, GetRequest, Include, Metadata, Pagination, Record,
    Tenant,
};
use crate::providers::store::{StoreError, VectorStore};

/// Maximum characters kept in a document preview.
const PREVIEW_CHARS: usize = 100;

/// Errors that can occur while browsing.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// A collection with its record count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    #[serde(flatten)]
    pub collection: Collection,
    /// `None` when the count could not be fetched.
    pub count: Option<usize>,
}

/// One page of documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPage {
    pub documents: Vec<Record>,
    pub page: usize,
    pub per_page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

impl DocumentPage {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// A stored embedding projected onto its first two components.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorPoint {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub vector: Vec<f32>,
    pub metadata: Option<Metadata>,
    pub document_preview: Option<String>,
}

/// Read-mostly views over tenants, collections and records.
pub struct CatalogService {
    store: Arc<dyn VectorStore>,
    default_tenant: String,
}

impl CatalogService {
    pub fn new(store: Arc<dyn VectorStore>, default_tenant: impl Into<String>) -> Self {
        Self {
            store,
            default_tenant: default_tenant.into(),
        }
    }

    /// Tenants the caller can browse.
    ///
    /// The API has no tenant listing, so this is the configured tenant.
    pub fn list_tenants(&self) -> Vec<Tenant> {
        vec![Tenant::new(&self.default_tenant)]
    }

    /// Lists collections with their record counts.
    ///
    /// A failed count leaves that collection's `count` empty instead of
    /// failing the listing.
    pub async fn collection_summaries(
        &self,
        db: &DatabaseRef,
        page: Pagination,
    ) -> CatalogResult<Vec<CollectionSummary>> {
        let collections = self.store.list_collections(db, page).await?;

        let mut summaries = Vec::with_capacity(collections.len());
        for collection in collections {
            let count = match self.store.count(db, &collection.id).await {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::warn!(collection = %db.describe(&collection.id), error = %e, "Failed to count collection");
                    None
                }
            };
            summaries.push(CollectionSummary { collection, count });
        }
        Ok(summaries)
    }

    /// Fetches a 1-based page of documents with metadata.
    pub async fn document_page(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        page: usize,
        per_page: usize,
    ) -> CatalogResult<DocumentPage> {
        if page == 0 {
            return Err(CatalogError::InvalidPage("pages start at 1".to_string()));
        }
        if per_page == 0 {
            return Err(CatalogError::InvalidPage(
                "page size must be at least 1".to_string(),
            ));
        }

        let window = Pagination::page(page, per_page).ok_or_else(|| {
            CatalogError::InvalidPage(format!("page {page} is out of range"))
        })?;

        let total_count = self.store.count(db, collection).await?;
        let request = GetRequest::page(window.limit, window.offset)
            .with_include(vec![Include::Documents, Include::Metadatas]);
        let response = self.store.get_documents(db, collection, &request).await?;

        Ok(DocumentPage {
            documents: response.records(),
            page,
            per_page,
            total_count,
            total_pages: total_count.div_ceil(per_page),
        })
    }

    /// Fetches up to `limit` embeddings as plot points, optionally narrowed
    /// by a metadata `where` clause.
    ///
    /// Records without at least two components are skipped.
    pub async fn vector_points(
        &self,
        db: &DatabaseRef,
        collection: &CollectionId,
        limit: usize,
        where_filter: Option<serde_json::Value>,
    ) -> CatalogResult<Vec<VectorPoint>> {
        let mut request = GetRequest::page(limit, 0).with_include(vec![
            Include::Embeddings,
            Include::Documents,
            Include::Metadatas,
        ]);
        if let Some(filter) = where_filter {
            request = request.with_where(filter);
        }
        let response = self.store.get_documents(db, collection, &request).await?;

        let points = response
            .records()
            .into_iter()
            .filter_map(|record| {
                let vector = record.embedding?;
                let (&x, &y) = (vector.first()?, vector.get(1)?);
                Some(VectorPoint {
                    id: record.id,
                    x,
                    y,
                    document_preview: record.document.as_deref().map(preview),
                    metadata: record.metadata,
                    vector,
                })
            })
            .collect();
        Ok(points)
    }
}

/// Truncates a document for display.
fn preview(document: &str) -> String {
    if document.chars().count() <= PREVIEW_CHARS {
        return document.to_string();
    }
    let mut short: String = document.chars().take(PREVIEW_CHARS).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GetResponse;
    use crate::providers::store::MockVectorStore;
    use pretty_assertions::assert_eq;

    fn collection(id: &str) -> Collection {
        Collection {
            id: CollectionId::from(id),
            name: id.to_string(),
            metadata: None,
            dimension: Some(3),
            tenant: None,
            database: None,
        }
    }

    fn not_found() -> StoreError {
        StoreError::Api {
            operation: "count records",
            target: "t/d/b".into(),
            status: 404,
            kind: Some("NotFoundError".into()),
            message: "missing".into(),
        }
    }

    fn service(store: MockVectorStore) -> CatalogService {
        CatalogService::new(Arc::new(store), "acme")
    }

    #[test]
    fn tenants_are_the_configured_default() {
        let service = service(MockVectorStore::new());
        assert_eq!(service.list_tenants(), vec![Tenant::new("acme")]);
    }

    #[tokio::test]
    async fn summaries_tolerate_failed_counts() {
        let mut store = MockVectorStore::new();
        store
            .expect_list_collections()
            .withf(|_, page| page.limit == 10 && page.offset == 0)
            .returning(|_, _| Ok(vec![collection("a"), collection("b")]));
        store.expect_count().returning(|_, id| match id.as_ref() {
            "a" => Ok(7),
            _ => Err(not_found()),
        });

        let summaries = service(store)
            .collection_summaries(&DatabaseRef::default(), Pagination::with_limit(10))
            .await
            .unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].count, Some(7));
        assert_eq!(summaries[1].count, None);
    }

    #[tokio::test]
    async fn summaries_fail_when_listing_fails() {
        let mut store = MockVectorStore::new();
        store
            .expect_list_collections()
            .returning(|_, _| Err(not_found()));

        let result = service(store)
            .collection_summaries(&DatabaseRef::default(), Pagination::default())
            .await;
        assert!(matches!(result, Err(CatalogError::Store(_))));
    }

    #[tokio::test]
    async fn document_page_computes_offsets_and_totals() {
        let mut store = MockVectorStore::new();
        store.expect_count().returning(|_, _| Ok(45));
        store
            .expect_get_documents()
            .withf(|_, _, request| {
                request.limit == 20
                    && request.offset == 40
                    && request.include == vec![Include::Documents, Include::Metadatas]
            })
            .returning(|_, _, _| {
                Ok(GetResponse {
                    ids: vec!["x".into()],
                    documents: Some(vec![Some("hello".into())]),
                    ..Default::default()
                })
            });

        let page = service(store)
            .document_page(&DatabaseRef::default(), &"docs".into(), 3, 20)
            .await
            .unwrap();

        assert_eq!(page.total_count, 45);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next());
        assert_eq!(page.documents[0].document.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn document_page_rejects_zero_page_or_size() {
        let service = service(MockVectorStore::new());
        let db = DatabaseRef::default();
        let id = CollectionId::from("docs");

        assert!(matches!(
            service.document_page(&db, &id, 0, 10).await,
            Err(CatalogError::InvalidPage(_))
        ));
        assert!(matches!(
            service.document_page(&db, &id, 1, 0).await,
            Err(CatalogError::InvalidPage(_))
        ));
    }

    #[tokio::test]
    async fn vector_points_project_and_skip_short_vectors() {
        let long_doc = "x".repeat(150);
        let docs = vec![Some(long_doc), Some("short".to_string()), None];

        let mut store = MockVectorStore::new();
        store
            .expect_get_documents()
            .withf(|_, _, request| {
                request.limit == 50
                    && request.include.contains(&Include::Embeddings)
                    && request.where_filter.is_none()
            })
            .returning(move |_, _, _| {
                Ok(GetResponse {
                    ids: vec!["a".into(), "b".into(), "c".into()],
                    documents: Some(docs.clone()),
                    metadatas: None,
                    embeddings: Some(vec![vec![0.1, 0.2, 0.3], vec![0.9], vec![0.4, 0.5]]),
                })
            });

        let points = service(store)
            .vector_points(&DatabaseRef::default(), &"docs".into(), 50, None)
            .await
            .unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!((points[0].x, points[0].y), (0.1, 0.2));
        assert_eq!(points[0].vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(points[0].document_preview.as_ref().unwrap().len(), 103);
        assert!(points[0].document_preview.as_ref().unwrap().ends_with("..."));
        assert_eq!(points[1].id, "c");
        assert_eq!(points[1].document_preview, None);
    }

    #[tokio::test]
    async fn document_page_rejects_page_past_offset_range() {
        let service = service(MockVectorStore::new());

        let result = service
            .document_page(&DatabaseRef::default(), &"docs".into(), usize::MAX / 2, 20)
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidPage(_))));
    }

    #[tokio::test]
    async fn vector_points_forward_where_filter() {
        let mut store = MockVectorStore::new();
        store
            .expect_get_documents()
            .withf(|_, _, request| {
                request.where_filter == Some(serde_json::json!({"schema": "public"}))
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(GetResponse {
                    ids: vec!["a".into()],
                    embeddings: Some(vec![vec![0.3, 0.7]]),
                    ..Default::default()
                })
            });

        let points = service(store)
            .vector_points(
                &DatabaseRef::default(),
                &"docs".into(),
                10,
                Some(serde_json::json!({"schema": "public"})),
            )
            .await
            .unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!((points[0].x, points[0].y), (0.3, 0.7));
    }

    #[test]
    fn short_documents_are_not_truncated() {
        assert_eq!(preview("hello"), "hello");
        assert_eq!(preview(&"é".repeat(100)), "é".repeat(100));
    }
}
