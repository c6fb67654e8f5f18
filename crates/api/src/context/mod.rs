//! Application context - dependency injection container

use std::sync::Arc;

use koshflow_core::{RefreshFailure, SessionObserver, TokenPersistence};
use koshflow_domain::{Config, ProfileResponse};
use koshflow_infra::{
    build_persistence, ApiClient, ApiClientConfig, ApiError, ApiRetry, AuthService,
};
use tracing::{debug, warn};

/// Application context - holds the configured client and services
pub struct AppContext {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub auth: AuthService,
    pub retry: ApiRetry,
}

impl AppContext {
    /// Wire the client from configuration, using the configured storage
    /// backend.
    ///
    /// # Errors
    /// Returns `ApiError::Config` for an invalid base URL or retry settings
    /// and `ApiError::Config`/`Storage` if the storage backend cannot be
    /// prepared.
    pub fn new(config: Config) -> Result<Self, ApiError> {
        let persistence = build_persistence(&config.storage)?;
        Self::with_persistence(config, persistence)
    }

    /// Same as [`AppContext::new`] with an explicit persistence backend.
    pub fn with_persistence(
        config: Config,
        persistence: Arc<dyn TokenPersistence>,
    ) -> Result<Self, ApiError> {
        let client = ApiClient::builder()
            .config(ApiClientConfig::from(&config.api))
            .persistence(persistence)
            .observer(Arc::new(CliSessionObserver))
            .build()?;
        let client = Arc::new(client);
        let auth = AuthService::new(Arc::clone(&client));
        let retry = ApiRetry::from_settings(&config.retry)?;

        debug!(base_url = %config.api.base_url, backend = ?config.storage.backend, "Context ready");
        Ok(Self { config, client, auth, retry })
    }

    /// Rehydrate the persisted session.
    ///
    /// # Errors
    /// Fails with `ApiError::SessionExpired` when no session is stored or the
    /// stored one was rejected; other errors are passed through.
    pub async fn require_session(&self) -> Result<ProfileResponse, ApiError> {
        self.auth.restore_session().await?.ok_or_else(not_logged_in)
    }
}

fn not_logged_in() -> ApiError {
    ApiError::SessionExpired("not logged in; run `koshflow login`".to_string())
}

/// Reports a dead session on the terminal.
pub struct CliSessionObserver;

impl SessionObserver for CliSessionObserver {
    fn session_expired(&self, reason: &RefreshFailure) {
        warn!(reason = %reason, "Session expired; run `koshflow login` to sign in again");
    }
}
