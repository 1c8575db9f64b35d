//! Tenants, databases and collections as reported by the store.

use serde::{Deserialize, Serialize};

use super::types::CollectionId;

/// Free-form metadata attached to collections and records.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// The caller's identity and the scopes it may access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub tenant: String,
    #[serde(default)]
    pub databases: Vec<String>,
}

/// A tenant, the top level of the store hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub name: String,
}

impl Tenant {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A database within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tenant: Option<String>,
}

/// A collection of records sharing one embedding space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    /// Embedding dimension, once the store has seen a first record.
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

/// Body for creating a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl NewCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
