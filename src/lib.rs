//! vector-view - Browse and semantically search a Chroma-compatible vector store
//!
//! This crate provides the core functionality for vector-view, including the
//! vector store REST client, local text embeddings and the search fallback
//! policy built on top of them.

pub mod app;
pub mod config;
pub mod domain;
pub mod embedding;
pub mod providers;
pub mod services;

pub use app::{App, Cli};
