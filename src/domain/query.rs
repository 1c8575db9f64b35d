//! Similarity query types.

use serde::{Deserialize, Serialize};

use super::catalog::Metadata;
use super::records::Include;
use super::types::{CollectionId, DatabaseRef};

/// Default number of results for a text search.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// A text search against one collection.
///
/// Built once and then only read; the orchestrator reuses the same request
/// for both the primary and the fallback attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    database: DatabaseRef,
    collection: CollectionId,
    text: String,
    limit: usize,
    where_filter: Option<serde_json::Value>,
}

impl QueryRequest {
    pub fn new(
        database: DatabaseRef,
        collection: impl Into<CollectionId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            database,
            collection: collection.into(),
            text: text.into(),
            limit: DEFAULT_QUERY_LIMIT,
            where_filter: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Restricts matches with a metadata `where` clause.
    pub fn with_where(mut self, filter: serde_json::Value) -> Self {
        self.where_filter = Some(filter);
        self
    }

    pub fn database(&self) -> &DatabaseRef {
        &self.database
    }

    pub fn collection(&self) -> &CollectionId {
        &self.collection
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn where_filter(&self) -> Option<&serde_json::Value> {
        self.where_filter.as_ref()
    }

    /// Builds the wire body for the given query vector.
    pub fn body(&self, vector: Vec<f32>) -> QueryEmbeddings {
        QueryEmbeddings {
            query_embeddings: vec![vector],
            n_results: self.limit,
            include: vec![Include::Documents, Include::Metadatas, Include::Distances],
            where_filter: self.where_filter.clone(),
        }
    }
}

/// Body for `POST .../collections/{id}/query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEmbeddings {
    pub query_embeddings: Vec<Vec<f32>>,
    pub n_results: usize,
    pub include: Vec<Include>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<serde_json::Value>,
}

/// Response of a similarity query: one inner array per query vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f32>>>>,
}

/// One ranked match of the first query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryHit {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
    pub distance: Option<f32>,
}

impl QueryResponse {
    /// Matches for the first query vector, in the store's ranking order.
    pub fn hits(&self) -> Vec<QueryHit> {
        let Some(ids) = self.ids.first() else {
            return Vec::new();
        };

        ids.iter()
            .enumerate()
            .map(|(i, id)| QueryHit {
                id: id.clone(),
                document: cell(&self.documents, i),
                metadata: cell(&self.metadatas, i),
                distance: cell(&self.distances, i),
            })
            .collect()
    }
}

fn cell<T: Clone>(column: &Option<Vec<Vec<Option<T>>>>, index: usize) -> Option<T> {
    column
        .as_ref()
        .and_then(|rows| rows.first())
        .and_then(|row| row.get(index).cloned().flatten())
}
