//! Authentication endpoints and the HTTP refresh call

use std::sync::Arc;

use async_trait::async_trait;
use koshflow_core::{RefreshFailure, RefreshTransport};
use koshflow_domain::constants::{
    AUTH_LOGIN_PATH, AUTH_LOGOUT_PATH, AUTH_PROFILE_PATH, AUTH_REFRESH_PATH, AUTH_REGISTER_PATH,
};
use koshflow_domain::{
    AuthResponse, LoginRequest, LogoutRequest, ProfileResponse, RefreshRequest, RegisterRequest,
    TokenPair,
};
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use super::client::{join_url, ApiClient, RequestOptions};
use super::errors::{read_failure_body, ApiError, ApiErrorCategory, HttpFailure};
use crate::http::HttpClient;

/// `POST /auth/refresh` issued straight through the HTTP client.
///
/// Bypasses the dispatcher so a rejected refresh can never recurse into
/// another refresh.
#[derive(Debug, Clone)]
pub struct HttpRefreshTransport {
    http: HttpClient,
    url: String,
}

impl HttpRefreshTransport {
    pub fn new(http: HttpClient, base_url: impl AsRef<str>) -> Self {
        Self { http, url: join_url(base_url.as_ref(), AUTH_REFRESH_PATH) }
    }
}

#[async_trait]
impl RefreshTransport for HttpRefreshTransport {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshFailure> {
        let body = RefreshRequest { refresh_token: refresh_token.to_string() };
        let request = self.http.request(Method::POST, &self.url).json(&body);

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| RefreshFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = read_failure_body(response).await;
            let failure = HttpFailure::from_parts(status, &headers, &text);
            return Err(RefreshFailure::Rejected {
                status: failure.status,
                message: failure.message,
            });
        }

        let bytes = response.bytes().await.map_err(|e| RefreshFailure::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RefreshFailure::InvalidResponse(e.to_string()))
    }
}

/// Login, registration, logout and session rehydration
#[derive(Clone)]
pub struct AuthService {
    client: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// `POST /auth/login`; stores the returned pair
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let options = RequestOptions::anonymous().json(request)?;
        let response: AuthResponse =
            self.client.request_as(Method::POST, AUTH_LOGIN_PATH, options).await?;

        self.client.tokens().set_pair(response.token_pair()).await?;
        info!(user_id = %response.user.id, "Logged in");
        Ok(response)
    }

    /// `POST /auth/register`; stores the returned pair
    #[instrument(skip_all)]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let options = RequestOptions::anonymous().json(request)?;
        let response: AuthResponse =
            self.client.request_as(Method::POST, AUTH_REGISTER_PATH, options).await?;

        self.client.tokens().set_pair(response.token_pair()).await?;
        info!(user_id = %response.user.id, "Registered");
        Ok(response)
    }

    /// Best-effort `POST /auth/logout`, then clear local tokens regardless
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let refresh_token = self.client.tokens().refresh_token().await;
        if refresh_token.is_some() {
            let body = LogoutRequest { refresh_token };
            let options = RequestOptions::new().json(&body)?;
            if let Err(err) = self.client.request(Method::POST, AUTH_LOGOUT_PATH, options).await {
                warn!(error = %err, "Logout request failed; clearing local session anyway");
            }
        }

        self.client.tokens().clear().await?;
        info!("Logged out");
        Ok(())
    }

    /// `GET /auth/me`
    pub async fn profile(&self) -> Result<ProfileResponse, ApiError> {
        self.client.get(AUTH_PROFILE_PATH).await
    }

    /// Load persisted tokens and verify them against the profile endpoint.
    ///
    /// Returns `None` when there is no complete stored session or when the
    /// stored session is rejected (the tokens are cleared in that case).
    /// Other failures leave the tokens in place and are returned.
    #[instrument(skip_all)]
    pub async fn restore_session(&self) -> Result<Option<ProfileResponse>, ApiError> {
        if !self.client.tokens().initialize().await? {
            debug!("No stored session to restore");
            return Ok(None);
        }

        match self.profile().await {
            Ok(profile) => {
                info!(user_id = %profile.user.id, "Session restored");
                Ok(Some(profile))
            }
            Err(err) if err.category() == ApiErrorCategory::Authentication => {
                warn!(error = %err, "Stored session rejected; clearing tokens");
                self.client.tokens().clear().await?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Whether an access token is held
    pub async fn is_authenticated(&self) -> bool {
        self.client.tokens().access_token().await.is_some()
    }
}
