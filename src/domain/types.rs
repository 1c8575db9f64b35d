//! Core identifier and scoping types.
//!
//! The store is organised as tenant → database → collection. These types
//! keep those levels from being mixed up in function signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenant used when none is configured.
pub const DEFAULT_TENANT: &str = "default_tenant";

/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "default_database";

/// Unique identifier for a collection (a UUID assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CollectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&String> for CollectionId {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl AsRef<str> for CollectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A tenant/database pair that scopes collection operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseRef {
    pub tenant: String,
    pub database: String,
}

impl DatabaseRef {
    pub fn new(tenant: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            database: database.into(),
        }
    }

    /// Describes a collection inside this database, for error context.
    pub fn describe(&self, collection: &CollectionId) -> String {
        format!("{}/{}/{}", self.tenant, self.database, collection)
    }
}

impl Default for DatabaseRef {
    fn default() -> Self {
        Self::new(DEFAULT_TENANT, DEFAULT_DATABASE)
    }
}

impl fmt::Display for DatabaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant, self.database)
    }
}

/// Pagination parameters for listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of items to skip.
    pub offset: usize,
    /// Maximum number of items to return.
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

impl Pagination {
    /// Creates a new pagination with the given limit.
    pub fn with_limit(limit: usize) -> Self {
        Self { offset: 0, limit }
    }

    /// Converts a 1-based page number into an offset/limit pair.
    ///
    /// Returns `None` when the offset does not fit in a `usize`.
    pub fn page(page: usize, per_page: usize) -> Option<Self> {
        let offset = page.saturating_sub(1).checked_mul(per_page)?;
        Some(Self {
            offset,
            limit: per_page,
        })
    }

    /// Returns the next page, or `None` past the end of the offset range.
    pub fn next_page(&self) -> Option<Self> {
        Some(Self {
            offset: self.offset.checked_add(self.limit)?,
            limit: self.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_id_display() {
        let id = CollectionId::from("6f1c0b9e");
        assert_eq!(id.to_string(), "6f1c0b9e");
    }

    #[test]
    fn collection_id_serializes_as_plain_string() {
        let id = CollectionId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }

    #[test]
    fn database_ref_describe() {
        let db = DatabaseRef::new("acme", "prod");
        assert_eq!(db.to_string(), "acme/prod");
        assert_eq!(db.describe(&CollectionId::from("docs")), "acme/prod/docs");
    }

    #[test]
    fn database_ref_default() {
        let db = DatabaseRef::default();
        assert_eq!(db.tenant, DEFAULT_TENANT);
        assert_eq!(db.database, DEFAULT_DATABASE);
    }

    #[test]
    fn pagination_page_numbers() {
        assert_eq!(Pagination::page(1, 20), Some(Pagination { offset: 0, limit: 20 }));
        assert_eq!(Pagination::page(3, 20), Some(Pagination { offset: 40, limit: 20 }));
        assert_eq!(Pagination::page(0, 20).map(|p| p.offset), Some(0));
    }

    #[test]
    fn pagination_rejects_offsets_that_overflow() {
        assert_eq!(Pagination::page(usize::MAX / 2, 20), None);
        assert_eq!(Pagination { offset: usize::MAX - 5, limit: 10 }.next_page(), None);
    }

    #[test]
    fn pagination_next_page() {
        let p = Pagination::with_limit(25);
        let next = p.next_page().unwrap();
        assert_eq!(next.offset, 25);
        assert_eq!(next.limit, 25);
    }
}
