//! Request dispatcher
//!
//! One HTTP call per attempt with JSON and bearer headers. An unauthorized
//! response on the first attempt goes through the [`RefreshCoordinator`] and
//! the request is re-issued once with the refreshed token; nothing else is
//! retried here.

use std::sync::Arc;
use std::time::Duration;

use koshflow_core::{
    InMemoryTokenPersistence, NoopSessionObserver, RefreshCoordinator, RefreshTransport,
    SessionObserver, TokenPersistence, TokenStore,
};
use koshflow_domain::constants::DEFAULT_API_BASE_URL;
use koshflow_domain::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::auth::HttpRefreshTransport;
use super::errors::{read_failure_body, ApiError};
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Base URL including the API prefix (e.g., "http://localhost:3001/api")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_BASE_URL.to_string(), timeout: Duration::from_secs(30) }
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// JSON body
    pub body: Option<Value>,
    /// Header overrides, applied after the standard headers
    pub headers: HeaderMap,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// Send without a bearer token and return 401 as-is
    pub anonymous: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for endpoints that must not carry or refresh credentials
    pub fn anonymous() -> Self {
        Self { anonymous: true, ..Self::default() }
    }

    /// Serialize `body` as the JSON payload
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// One dispatch of a request. `retry_count` is 0 or 1.
#[derive(Debug)]
struct RequestAttempt<'a> {
    method: &'a Method,
    endpoint: &'a str,
    options: &'a RequestOptions,
    retry_count: u8,
}

/// Authenticated API client
///
/// Owns one session: clones of the inner `Arc`s share tokens and the refresh
/// state, separate `ApiClient`s are isolated.
pub struct ApiClient {
    http: HttpClient,
    config: ApiClientConfig,
    tokens: Arc<TokenStore>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Session token store
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Absolute URL for an endpoint path
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        join_url(&self.config.base_url, endpoint)
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_as(Method::GET, path, RequestOptions::new()).await
    }

    /// Execute a POST request with a JSON body
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_as(Method::POST, path, RequestOptions::new().json(body)?).await
    }

    /// Execute a PUT request with a JSON body
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_as(Method::PUT, path, RequestOptions::new().json(body)?).await
    }

    /// Execute a PATCH request with a JSON body
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_as(Method::PATCH, path, RequestOptions::new().json(body)?).await
    }

    /// Execute a DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_as(Method::DELETE, path, RequestOptions::new()).await
    }

    /// [`Self::request`] decoded into `T`
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let value = self.request(method, endpoint, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Dispatch a request and return the parsed JSON body.
    ///
    /// 204/205 and empty bodies decode as `null`.
    #[instrument(skip_all, fields(%method, endpoint))]
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let mut attempt =
            RequestAttempt { method: &method, endpoint, options: &options, retry_count: 0 };
        let mut token = if options.anonymous { None } else { self.tokens.access_token().await };

        loop {
            let response = self.dispatch(&attempt, token.as_deref()).await?;
            let status = response.status();
            if status.is_success() {
                return decode_body(response).await;
            }

            let headers = response.headers().clone();
            let body = read_failure_body(response).await;
            let error = ApiError::from_response(status, &headers, &body);

            if status != StatusCode::UNAUTHORIZED || options.anonymous {
                return Err(error);
            }
            if attempt.retry_count > 0 {
                warn!(endpoint, "Unauthorized after token refresh");
                return Err(error);
            }
            if !self.tokens.has_refresh_token().await {
                debug!(endpoint, "Unauthorized with no refresh token");
                return Err(error);
            }

            match self.refresh.refresh(token.as_deref()).await {
                Ok(fresh) => {
                    token = Some(fresh);
                    attempt.retry_count = 1;
                }
                Err(failure) => return Err(ApiError::SessionExpired(failure.to_string())),
            }
        }
    }

    async fn dispatch(
        &self,
        attempt: &RequestAttempt<'_>,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        debug!(
            method = %attempt.method,
            endpoint = attempt.endpoint,
            retry_count = attempt.retry_count,
            "Dispatching request"
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::Config("access token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in &attempt.options.headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut builder = self
            .http
            .request(attempt.method.clone(), self.endpoint_url(attempt.endpoint))
            .headers(headers);
        if !attempt.options.query.is_empty() {
            builder = builder.query(&attempt.options.query);
        }
        if let Some(body) = &attempt.options.body {
            builder = builder.body(body.to_string());
        }

        self.http
            .send(builder)
            .await
            .map_err(|err| ApiError::from_transport(&err, self.http.timeout()))
    }
}

async fn decode_body(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return Ok(Value::Null);
    }

    let bytes = response.bytes().await.map_err(|e| ApiError::Network(e.to_string()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// `base` + `path` with exactly one slash between them
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    config: ApiClientConfig,
    http: Option<HttpClient>,
    persistence: Option<Arc<dyn TokenPersistence>>,
    observer: Option<Arc<dyn SessionObserver>>,
    transport: Option<Arc<dyn RefreshTransport>>,
}

impl ApiClientBuilder {
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Reuse an existing HTTP client instead of building one from the config
    pub fn http_client(mut self, http: HttpClient) -> Self {
        self.http = Some(http);
        self
    }

    /// Durable token storage; defaults to process memory
    pub fn persistence(mut self, persistence: Arc<dyn TokenPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Notified when a failed refresh ends the session
    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Replace the HTTP refresh call
    pub fn refresh_transport(mut self, transport: Arc<dyn RefreshTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL does not parse or the HTTP
    /// client cannot be created.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let url = Url::parse(&self.config.base_url).map_err(|e| {
            ApiError::Config(format!("Invalid base URL {}: {e}", self.config.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!("Unsupported URL scheme: {}", url.scheme())));
        }

        let http = match self.http {
            Some(http) => http,
            None => HttpClient::builder().timeout(self.config.timeout).build()?,
        };

        let persistence = self
            .persistence
            .unwrap_or_else(|| Arc::new(InMemoryTokenPersistence::new()));
        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopSessionObserver));
        let transport = self.transport.unwrap_or_else(|| {
            Arc::new(HttpRefreshTransport::new(http.clone(), self.config.base_url.clone()))
        });

        let tokens = Arc::new(TokenStore::new(persistence));
        let refresh = RefreshCoordinator::new(Arc::clone(&tokens), transport, observer);

        Ok(ApiClient { http, config: self.config, tokens, refresh })
    }
}
