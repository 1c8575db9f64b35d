//! Application settings and configuration types.
//!
//! Settings are persisted to `~/.config/vector-view/settings.json` (or the
//! platform equivalent) and can be overridden from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DatabaseRef, DEFAULT_DATABASE, DEFAULT_QUERY_LIMIT, DEFAULT_TENANT};
use crate::embedding::ModelType;

/// Errors raised while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Result type for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Top-level application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Vector store connection.
    pub api: ApiSettings,
    /// Embedding model selection.
    pub embedding: EmbeddingSettings,
    /// Text search behaviour.
    pub search: SearchSettings,
}

/// Connection to the vector store REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL including the API version path.
    pub base_url: String,
    /// Timeout applied to every request, in seconds.
    pub timeout_secs: u64,
    /// Tenant used when a command does not name one.
    pub tenant: String,
    /// Database used when a command does not name one.
    pub database: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v2".to_string(),
            timeout_secs: 10,
            tenant: DEFAULT_TENANT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn database_ref(&self) -> DatabaseRef {
        DatabaseRef::new(&self.tenant, &self.database)
    }
}

/// Embedding model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Hugging Face model id.
    pub model: String,
    /// Hub revision (branch, tag or commit).
    pub revision: String,
    /// Overrides the model's maximum sequence length.
    pub max_seq_length: Option<usize>,
    /// Hub cache directory; the hub default is used when unset.
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: ModelType::default().hf_model_id().to_string(),
            revision: "main".to_string(),
            max_seq_length: None,
            cache_dir: None,
        }
    }
}

/// Settings for text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Result limit when a search does not specify one.
    pub default_limit: usize,
    /// Whether a failed semantic search is retried with a random vector.
    pub fallback_enabled: bool,
    /// Dimension of the random fallback vector.
    pub fallback_dimension: usize,
    /// Refuse to send a fallback vector whose dimension differs from the
    /// collection's.
    pub check_collection_dimension: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_QUERY_LIMIT,
            fallback_enabled: true,
            fallback_dimension: ModelType::default().embedding_dim(),
            check_collection_dimension: true,
        }
    }
}

impl Settings {
    /// Default settings location for this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "panbanda", "vector-view")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from `path`, falling back to defaults if it is missing.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> SettingsResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> SettingsResult<()> {
        if let Some(url) = lookup("VECTOR_VIEW_URL") {
            self.api.base_url = url;
        }
        if let Some(tenant) = lookup("VECTOR_VIEW_TENANT") {
            self.api.tenant = tenant;
        }
        if let Some(database) = lookup("VECTOR_VIEW_DATABASE") {
            self.api.database = database;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(raw) = lookup("VECTOR_VIEW_TIMEOUT_SECS") {
            self.api.timeout_secs = raw.parse().map_err(|_| SettingsError::InvalidValue {
                key: "VECTOR_VIEW_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
        }
        Ok(())
    }
}
