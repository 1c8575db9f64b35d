//! Saved connection profiles.
//!
//! A profile names a vector store endpoint together with the tenant and
//! database to browse. Profiles live in `connections.json` next to the
//! settings file; at most one is active.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::settings::ApiSettings;

/// Errors that can occur while managing connection profiles.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Connection not found: {0}")]
    NotFound(String),

    #[error("Connection name must not be empty")]
    EmptyName,

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode connections: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for connection operations.
pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

/// A named vector store endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub tenant: String,
    pub database: String,
    /// Embedding model to use with this store, if it differs from the default.
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

impl ConnectionProfile {
    /// Creates a profile pointing at `base_url` with the default scope.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let defaults = ApiSettings::default();
        Self {
            id: String::new(),
            name: name.into(),
            base_url: base_url.into(),
            tenant: defaults.tenant,
            database: defaults.database,
            embedding_model: None,
            description: None,
            created_at: None,
            last_used: None,
            is_active: false,
        }
    }

    pub fn with_scope(mut self, tenant: impl Into<String>, database: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self.database = database.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// API settings for this profile, keeping the timeout from `base`.
    pub fn api_settings(&self, base: &ApiSettings) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            tenant: self.tenant.clone(),
            database: self.database.clone(),
            timeout_secs: base.timeout_secs,
        }
    }
}

/// Summary of the stored profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub active_connection_id: Option<String>,
    pub active_connection: Option<ConnectionProfile>,
    pub total_connections: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConnectionFile {
    #[serde(default)]
    connections: HashMap<String, ConnectionProfile>,
    #[serde(default)]
    active_connection_id: Option<String>,
}

/// File-backed collection of connection profiles.
#[derive(Debug)]
pub struct ConnectionStore {
    path: PathBuf,
    connections: HashMap<String, ConnectionProfile>,
    active_id: Option<String>,
}

impl ConnectionStore {
    /// Default `connections.json` location, next to the settings file.
    pub fn default_path() -> Option<PathBuf> {
        super::Settings::default_path()
            .and_then(|p| p.parent().map(|dir| dir.join("connections.json")))
    }

    /// Opens the store at `path`.
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file is
    /// logged and also yields an empty store; it is overwritten on next save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<ConnectionFile>(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable connections file");
                ConnectionFile::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ConnectionFile::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read connections file");
                ConnectionFile::default()
            }
        };

        Self {
            path,
            connections: file.connections,
            active_id: file.active_connection_id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> ConnectionResult<()> {
        let file = ConnectionFile {
            connections: self.connections.clone(),
            active_connection_id: self.active_id.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let io_err = |source| ConnectionError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&self.path, json).map_err(io_err)
    }

    /// Adds a profile, assigning an id and creation time when missing.
    ///
    /// Returns the profile id.
    pub fn add(&mut self, mut profile: ConnectionProfile) -> ConnectionResult<String> {
        if profile.name.trim().is_empty() {
            return Err(ConnectionError::EmptyName);
        }
        if profile.id.is_empty() {
            profile.id = format!("conn-{}", uuid::Uuid::new_v4());
        }
        if profile.created_at.is_none() {
            profile.created_at = Some(Utc::now());
        }
        profile.is_active = false;

        let id = profile.id.clone();
        self.connections.insert(id.clone(), profile);
        self.save()?;
        Ok(id)
    }

    /// Replaces an existing profile, keeping its id and active flag.
    pub fn update(&mut self, id: &str, mut profile: ConnectionProfile) -> ConnectionResult<()> {
        let existing = self
            .connections
            .get(id)
            .ok_or_else(|| ConnectionError::NotFound(id.to_string()))?;

        profile.id = id.to_string();
        profile.is_active = existing.is_active;
        if profile.created_at.is_none() {
            profile.created_at = existing.created_at;
        }
        self.connections.insert(id.to_string(), profile);
        self.save()
    }

    /// Removes a profile. Removing the active profile clears the selection.
    pub fn remove(&mut self, id: &str) -> ConnectionResult<ConnectionProfile> {
        let removed = self
            .connections
            .remove(id)
            .ok_or_else(|| ConnectionError::NotFound(id.to_string()))?;

        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.save()?;
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&ConnectionProfile> {
        self.connections.get(id)
    }

    /// All profiles sorted by name.
    pub fn list(&self) -> Vec<&ConnectionProfile> {
        let mut profiles: Vec<_> = self.connections.values().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        profiles
    }

    /// Makes `id` the only active profile and stamps its last use.
    pub fn activate(&mut self, id: &str) -> ConnectionResult<&ConnectionProfile> {
        if !self.connections.contains_key(id) {
            return Err(ConnectionError::NotFound(id.to_string()));
        }

        let now = Utc::now();
        for (key, profile) in self.connections.iter_mut() {
            profile.is_active = key == id;
            if profile.is_active {
                profile.last_used = Some(now);
            }
        }
        self.active_id = Some(id.to_string());
        self.save()?;

        self.connections
            .get(id)
            .ok_or_else(|| ConnectionError::NotFound(id.to_string()))
    }

    /// Clears the active profile.
    pub fn deactivate(&mut self) -> ConnectionResult<()> {
        for profile in self.connections.values_mut() {
            profile.is_active = false;
        }
        self.active_id = None;
        self.save()
    }

    pub fn active(&self) -> Option<&ConnectionProfile> {
        self.active_id
            .as_deref()
            .and_then(|id| self.connections.get(id))
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            active_connection_id: self.active_id.clone(),
            active_connection: self.active().cloned(),
            total_connections: self.connections.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> (tempfile::TempDir, ConnectionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConnectionStore::open(dir.path().join("connections.json"));
        (dir, store)
    }

    #[test]
    fn open_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.list().is_empty());
        assert!(store.active().is_none());
    }

    #[test]
    fn open_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connections.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = ConnectionStore::open(&path);
        assert_eq!(store.status().total_connections, 0);
    }

    #[test]
    fn add_assigns_id_and_timestamp() {
        let (_dir, mut store) = store();
        let id = store
            .add(ConnectionProfile::new("local", "http://localhost:8000/api/v2"))
            .unwrap();

        let profile = store.get(&id).unwrap();
        assert!(id.starts_with("conn-"));
        assert!(profile.created_at.is_some());
        assert!(!profile.is_active);
    }

    #[test]
    fn add_rejects_empty_name() {
        let (_dir, mut store) = store();
        let err = store
            .add(ConnectionProfile::new("  ", "http://localhost:8000/api/v2"))
            .unwrap_err();
        assert!(matches!(err, ConnectionError::EmptyName));
    }

    #[test]
    fn profiles_persist_across_opens() {
        let (dir, mut store) = store();
        let id = store
            .add(
                ConnectionProfile::new("staging", "https://staging/api/v2")
                    .with_scope("acme", "docs")
                    .with_description("Staging cluster"),
            )
            .unwrap();
        store.activate(&id).unwrap();

        let reopened = ConnectionStore::open(dir.path().join("connections.json"));
        let active = reopened.active().unwrap();
        assert_eq!(active.id, id);
        assert_eq!(active.tenant, "acme");
        assert_eq!(active.description.as_deref(), Some("Staging cluster"));
    }

    #[test]
    fn activate_is_exclusive() {
        let (_dir, mut store) = store();
        let a = store.add(ConnectionProfile::new("a", "http://a")).unwrap();
        let b = store.add(ConnectionProfile::new("b", "http://b")).unwrap();

        store.activate(&a).unwrap();
        store.activate(&b).unwrap();

        assert!(!store.get(&a).unwrap().is_active);
        assert!(store.get(&b).unwrap().is_active);
        assert!(store.get(&b).unwrap().last_used.is_some());
        assert_eq!(store.status().active_connection_id, Some(b));
    }

    #[test]
    fn activate_unknown_profile() {
        let (_dir, mut store) = store();
        assert!(matches!(
            store.activate("missing"),
            Err(ConnectionError::NotFound(_))
        ));
    }

    #[test]
    fn removing_active_profile_clears_selection() {
        let (_dir, mut store) = store();
        let id = store.add(ConnectionProfile::new("a", "http://a")).unwrap();
        store.activate(&id).unwrap();

        store.remove(&id).unwrap();

        assert!(store.active().is_none());
        assert_eq!(store.status().total_connections, 0);
    }

    #[test]
    fn update_keeps_identity_and_active_flag() {
        let (_dir, mut store) = store();
        let id = store.add(ConnectionProfile::new("a", "http://a")).unwrap();
        store.activate(&id).unwrap();
        let created = store.get(&id).unwrap().created_at;

        store
            .update(&id, ConnectionProfile::new("renamed", "http://b"))
            .unwrap();

        let profile = store.get(&id).unwrap();
        assert_eq!(profile.name, "renamed");
        assert_eq!(profile.base_url, "http://b");
        assert!(profile.is_active);
        assert_eq!(profile.created_at, created);
    }

    #[test]
    fn list_is_sorted_by_name() {
        let (_dir, mut store) = store();
        store.add(ConnectionProfile::new("zeta", "http://z")).unwrap();
        store.add(ConnectionProfile::new("alpha", "http://a")).unwrap();

        let names: Vec<_> = store.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn profile_to_api_settings() {
        let base = ApiSettings {
            timeout_secs: 42,
            ..Default::default()
        };
        let api = ConnectionProfile::new("remote", "https://remote/api/v2")
            .with_scope("t", "d")
            .api_settings(&base);

        assert_eq!(api.base_url, "https://remote/api/v2");
        assert_eq!(api.tenant, "t");
        assert_eq!(api.database, "d");
        assert_eq!(api.timeout_secs, 42);
    }

    #[test]
    fn deactivate_clears_all_flags() {
        let (_dir, mut store) = store();
        let id = store.add(ConnectionProfile::new("a", "http://a")).unwrap();
        store.activate(&id).unwrap();

        store.deactivate().unwrap();

        assert!(store.active().is_none());
        assert!(!store.get(&id).unwrap().is_active);
    }
}
