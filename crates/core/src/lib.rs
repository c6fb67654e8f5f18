//! # KoshFlow Core
//!
//! Session logic for the API client - no HTTP or platform code.
//!
//! This crate contains:
//! - Port interfaces (traits) for token persistence, the refresh call and
//!   session-expiry notification
//! - [`TokenStore`], the single source of truth for the current token pair
//! - [`RefreshCoordinator`], the single-flight refresh state machine
//!
//! ## Architecture Principles
//! - Only depends on `koshflow-common` and `koshflow-domain`
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod session;

pub use session::error::{RefreshFailure, SessionError};
pub use session::memory::InMemoryTokenPersistence;
pub use session::ports::{NoopSessionObserver, RefreshTransport, SessionObserver, TokenPersistence};
pub use session::refresh::{RefreshCoordinator, RefreshState};
pub use session::token_store::TokenStore;
