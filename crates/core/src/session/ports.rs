//! Port interfaces for session management
//!
//! These traits define the boundaries between the session logic and the
//! infrastructure that stores tokens and talks to the refresh endpoint.

use async_trait::async_trait;
use koshflow_domain::TokenPair;

use super::error::{RefreshFailure, SessionError};

/// Durable key/value storage for tokens.
///
/// Keys are `token` and `refreshToken`. `remove` on a missing key succeeds.
#[async_trait]
pub trait TokenPersistence: Send + Sync {
    /// Read a stored value
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write a value, replacing any previous one
    async fn store(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Delete a value
    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// The upstream refresh call.
///
/// Implementations must not route through the dispatcher's 401 handling.
#[async_trait]
pub trait RefreshTransport: Send + Sync {
    /// Exchange a refresh token for a rotated pair
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshFailure>;
}

/// Notified when a failed refresh tears the session down.
pub trait SessionObserver: Send + Sync {
    /// Called once per failed refresh, after tokens are cleared
    fn session_expired(&self, reason: &RefreshFailure);
}

/// Observer that ignores notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionObserver;

impl SessionObserver for NoopSessionObserver {
    fn session_expired(&self, _reason: &RefreshFailure) {}
}
