//! Configuration and settings management.
//!
//! This module provides application settings types and persistence, plus
//! the saved connection profiles. Both are stored in the user's config
//! directory as JSON.

mod connections;
mod settings;

pub use connections::{
    ConnectionError, ConnectionProfile, ConnectionResult, ConnectionStatus, ConnectionStore,
};
pub use settings::{
    ApiSettings, EmbeddingSettings, SearchSettings, Settings, SettingsError, SettingsResult,
};
