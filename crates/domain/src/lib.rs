//! # KoshFlow Domain
//!
//! Wire types and configuration models for the KoshFlow API client.
//!
//! This crate contains:
//! - Auth payloads and the token pair carried by every session
//! - Error payloads returned by the backend on non-2xx responses
//! - Configuration structures
//! - Domain constants (endpoint paths, persistence keys)
//!
//! ## Architecture
//! - No dependencies on other KoshFlow crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
