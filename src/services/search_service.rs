//! Text search with a single random-vector fallback.
//!
//! A search first embeds the query text and runs a similarity query. If any
//! part of that fails, the query is reissued exactly once with a random
//! vector so the caller still gets a result set of the expected shape.
//! Fallback results are not semantically ranked and are flagged as such.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::SearchSettings;
use crate::domain::{QueryHit, QueryRequest, QueryResponse};
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::providers::store::{StoreError, VectorStore};

/// Which attempt produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attempt {
    /// The query text was embedded and the store answered.
    Primary,
    /// The primary attempt failed; a random vector was used instead.
    Fallback,
}

/// Why the primary attempt failed.
#[derive(Debug, Error)]
pub enum PrimaryFailure {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store query failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur during a text search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Primary attempt failed and fallback is disabled.
    #[error("Search of {target} failed: {source}")]
    Primary {
        target: String,
        #[source]
        source: PrimaryFailure,
    },

    /// Collection dimension does not match the fallback vector.
    #[error(
        "Search of {target} failed ({primary}); fallback not attempted: collection dimension {expected} differs from fallback dimension {actual}"
    )]
    DimensionMismatch {
        target: String,
        primary: PrimaryFailure,
        expected: usize,
        actual: usize,
    },

    /// Both attempts failed.
    #[error("Search of {target} failed ({primary}); fallback also failed: {source}")]
    FallbackExhausted {
        target: String,
        primary: PrimaryFailure,
        #[source]
        source: StoreError,
    },
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Result of a text search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub attempt: Attempt,
    pub response: QueryResponse,
    /// Primary failure message when the fallback answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_error: Option<String>,
}

impl SearchOutcome {
    /// True when results came from a random vector and carry no ranking.
    pub fn is_degraded(&self) -> bool {
        self.attempt == Attempt::Fallback
    }

    pub fn hits(&self) -> Vec<QueryHit> {
        self.response.hits()
    }
}

/// Resolves text queries into similarity queries against the store.
pub struct SearchOrchestrator {
    store: Arc<dyn VectorStore>,
    embedder: Arc<EmbeddingProvider>,
    settings: SearchSettings,
}

impl SearchOrchestrator {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<EmbeddingProvider>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            settings,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Runs a text search.
    ///
    /// The primary attempt always completes before the fallback starts, and
    /// at most two store queries are issued.
    pub async fn search_by_text(&self, request: &QueryRequest) -> SearchResult<SearchOutcome> {
        if request.text().trim().is_empty() {
            return Err(SearchError::InvalidQuery("query text is empty".to_string()));
        }
        if request.limit() == 0 {
            return Err(SearchError::InvalidQuery(
                "result limit must be at least 1".to_string(),
            ));
        }

        let target = request.database().describe(request.collection());
        let primary = match self.primary(request).await {
            Ok(response) => {
                tracing::debug!(
                    collection = %target,
                    results = response.ids.first().map_or(0, Vec::len),
                    "Semantic search complete"
                );
                return Ok(SearchOutcome {
                    attempt: Attempt::Primary,
                    response,
                    primary_error: None,
                });
            }
            Err(e) => e,
        };

        if !self.settings.fallback_enabled {
            return Err(SearchError::Primary {
                target,
                source: primary,
            });
        }

        let dimension = self.settings.fallback_dimension;
        if let Some(expected) = self.collection_dimension(request).await {
            if expected != dimension {
                return Err(SearchError::DimensionMismatch {
                    target,
                    primary,
                    expected,
                    actual: dimension,
                });
            }
        }

        tracing::warn!(
            collection = %request.collection(),
            tenant = %request.database().tenant,
            database = %request.database().database,
            error = %primary,
            "Semantic search failed, retrying with a random vector; results will not be ranked"
        );

        let vector = self.embedder.random_vector(dimension);
        match self
            .store
            .query(
                request.database(),
                request.collection(),
                &request.body(vector.into_inner()),
            )
            .await
        {
            Ok(response) => Ok(SearchOutcome {
                attempt: Attempt::Fallback,
                response,
                primary_error: Some(primary.to_string()),
            }),
            Err(source) => Err(SearchError::FallbackExhausted {
                target,
                primary,
                source,
            }),
        }
    }

    async fn primary(&self, request: &QueryRequest) -> Result<QueryResponse, PrimaryFailure> {
        let embedding = self.embedder.embed(request.text()).await?;
        let response = self
            .store
            .query(
                request.database(),
                request.collection(),
                &request.body(embedding.into_inner()),
            )
            .await?;
        Ok(response)
    }

    /// Dimension the collection reports, if checking is on and it is known.
    async fn collection_dimension(&self, request: &QueryRequest) -> Option<usize> {
        if !self.settings.check_collection_dimension {
            return None;
        }
        match self
            .store
            .get_collection(request.database(), request.collection())
            .await
        {
            Ok(collection) => collection.dimension,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read collection dimension");
                None
            }
        }
    }
}
