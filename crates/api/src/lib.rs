//! # KoshFlow App
//!
//! Command-line application layer.
//!
//! This crate contains:
//! - CLI argument definitions
//! - Commands (CLI → API client bridge)
//! - Application context (dependency injection)
//! - Logging bootstrap
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - The `koshflow` binary is a thin shell over this library

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use cli::{Cli, Command, LogFormat};
pub use context::*;
