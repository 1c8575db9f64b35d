//! Application context and command-line front end.

mod commands;

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use crate::config::Settings;
use crate::domain::DatabaseRef;
use crate::embedding::{BertLoader, EmbeddingProvider, ModelLoader, ModelStatus};
use crate::providers::store::{ChromaClient, VectorStore};
use crate::services::{CatalogService, SearchOrchestrator};

pub use commands::{Cli, Command, ConnectionsCommand};

/// Connectivity and model state, as reported by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct AppStatus {
    pub store_url: String,
    pub tenant: String,
    pub database: String,
    /// Server heartbeat in nanoseconds, when reachable.
    pub heartbeat: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
    pub model: ModelStatus,
}

/// Shared services for one configured store.
///
/// Holds the single [`EmbeddingProvider`] for the process; every service
/// that embeds text borrows it from here.
pub struct App {
    settings: Settings,
    store: Arc<dyn VectorStore>,
    embedder: Arc<EmbeddingProvider>,
    search: SearchOrchestrator,
    catalog: CatalogService,
}

impl App {
    /// Builds the store client and model loader described by `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = ChromaClient::from_settings(&settings.api)?;
        let loader = BertLoader::from_settings(&settings.embedding);
        Ok(Self::with_parts(settings, Arc::new(store), Arc::new(loader)))
    }

    /// Wires the services around an existing store and model loader.
    pub fn with_parts(
        settings: Settings,
        store: Arc<dyn VectorStore>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        let embedder = Arc::new(EmbeddingProvider::new(loader));
        let search = SearchOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&embedder),
            settings.search.clone(),
        );
        let catalog = CatalogService::new(Arc::clone(&store), settings.api.tenant.clone());

        Self {
            settings,
            store,
            embedder,
            search,
            catalog,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    pub fn embedder(&self) -> &EmbeddingProvider {
        &self.embedder
    }

    pub fn search(&self) -> &SearchOrchestrator {
        &self.search
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    /// Tenant and database commands run against by default.
    pub fn database(&self) -> DatabaseRef {
        self.settings.api.database_ref()
    }

    /// Pings the store and reports the model state. Never fails.
    pub async fn status(&self) -> AppStatus {
        let (heartbeat, store_error) = match self.store.heartbeat().await {
            Ok(beat) => (Some(beat), None),
            Err(e) => {
                tracing::warn!(error = %e, "Vector store unreachable");
                (None, Some(e.to_string()))
            }
        };

        AppStatus {
            store_url: self.settings.api.base_url.clone(),
            tenant: self.settings.api.tenant.clone(),
            database: self.settings.api.database.clone(),
            heartbeat,
            store_error,
            model: self.embedder.status(),
        }
    }
}
