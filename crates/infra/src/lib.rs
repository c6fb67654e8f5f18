//! # KoshFlow Infrastructure
//!
//! Infrastructure implementations of the session ports defined in
//! `koshflow-core`.
//!
//! This crate contains:
//! - The reqwest-backed HTTP client and the authenticated API client
//! - Auth endpoints and the HTTP refresh transport
//! - Token persistence backends (keychain, file)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `koshflow-core`
//! - Depends on `koshflow-common`, `koshflow-domain` and `koshflow-core`
//! - Contains all "impure" code (network, keychain, filesystem)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod storage;

// Re-export commonly used items
pub use api::*;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use storage::{
    build_persistence, default_token_path, FileTokenPersistence, KeychainTokenPersistence,
};
