//! External service providers.
//!
//! This module contains provider traits and implementations for external services:
//!
//! - [`store`] - Vector store REST API (Chroma v2)
//!
//! Embedding models run in-process; see [`crate::embedding`].

pub mod store;
