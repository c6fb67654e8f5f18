//! API-specific error types
//!
//! Every failure the dispatcher can produce is one [`ApiError`] variant.
//! HTTP failures keep the status, the backend's message/code and any
//! field-level details so callers can surface validation errors verbatim.

use std::fmt;
use std::time::Duration;

use koshflow_common::{ErrorClassification, ErrorSeverity};
use koshflow_core::SessionError;
use koshflow_domain::{ErrorBody, FieldError, KoshflowError};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Connection failures and timeouts - retryable
    Network,
    /// 400/422 - non-retryable
    Validation,
    /// 401 and expired sessions - re-authenticate
    Authentication,
    /// 403
    Authorization,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 429 - retry with backoff
    RateLimit,
    /// Other 4xx - non-retryable
    Client,
    /// 5xx - retryable
    Server,
    /// Unreadable response body
    Decode,
    /// Local token storage
    Storage,
    /// Invalid client configuration
    Config,
}

/// A non-2xx response, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    pub status: u16,
    pub message: String,
    pub code: Option<String>,
    pub details: Vec<FieldError>,
    pub retry_after: Option<Duration>,
}

impl HttpFailure {
    /// Build from a status, the raw body and response headers.
    ///
    /// Falls back to `"Request failed: <code> <reason>"` when the body has no
    /// message.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: &str) -> Self {
        let parsed = ErrorBody::parse(body).unwrap_or_default();
        let message = parsed.message.unwrap_or_else(|| status_line_message(status));

        Self {
            status: status.as_u16(),
            message,
            code: parsed.code,
            details: parsed.details,
            retry_after: parse_retry_after(headers),
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// API operation errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Validation(HttpFailure),

    #[error("{0}")]
    Unauthorized(HttpFailure),

    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("{0}")]
    Forbidden(HttpFailure),

    #[error("{0}")]
    NotFound(HttpFailure),

    #[error("{0}")]
    Conflict(HttpFailure),

    #[error("{0}")]
    RateLimited(HttpFailure),

    #[error("{0}")]
    Client(HttpFailure),

    #[error("{0}")]
    Server(HttpFailure),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Map a non-2xx response onto its variant.
    pub fn from_response(status: StatusCode, headers: &HeaderMap, body: &str) -> Self {
        let failure = HttpFailure::from_parts(status, headers, body);
        match status.as_u16() {
            400 | 422 => Self::Validation(failure),
            401 => Self::Unauthorized(failure),
            403 => Self::Forbidden(failure),
            404 => Self::NotFound(failure),
            409 => Self::Conflict(failure),
            429 => Self::RateLimited(failure),
            500..=599 => Self::Server(failure),
            _ => Self::Client(failure),
        }
    }

    /// Map a transport error (no HTTP response).
    pub fn from_transport(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    fn failure(&self) -> Option<&HttpFailure> {
        match self {
            Self::Validation(f)
            | Self::Unauthorized(f)
            | Self::Forbidden(f)
            | Self::NotFound(f)
            | Self::Conflict(f)
            | Self::RateLimited(f)
            | Self::Client(f)
            | Self::Server(f) => Some(f),
            _ => None,
        }
    }

    /// HTTP status, when the error came from (or stands for) a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired(_) => Some(401),
            other => other.failure().map(|f| f.status),
        }
    }

    /// Machine-readable code from the error body
    pub fn code(&self) -> Option<&str> {
        self.failure().and_then(|f| f.code.as_deref())
    }

    /// Field-level details from the error body, in server order
    pub fn details(&self) -> &[FieldError] {
        match self.failure() {
            Some(f) => &f.details,
            None => &[],
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self.failure() {
            Some(f) => f.message.clone(),
            None => self.to_string(),
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Validation(_) => ApiErrorCategory::Validation,
            Self::Unauthorized(_) | Self::SessionExpired(_) => ApiErrorCategory::Authentication,
            Self::Forbidden(_) => ApiErrorCategory::Authorization,
            Self::NotFound(_) => ApiErrorCategory::NotFound,
            Self::Conflict(_) => ApiErrorCategory::Conflict,
            Self::RateLimited(_) => ApiErrorCategory::RateLimit,
            Self::Client(_) => ApiErrorCategory::Client,
            Self::Server(_) => ApiErrorCategory::Server,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Storage(_) => ApiErrorCategory::Storage,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::Network | ApiErrorCategory::RateLimit | ApiErrorCategory::Server
        )
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        self.should_retry()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ApiErrorCategory::Network | ApiErrorCategory::RateLimit => ErrorSeverity::Warning,
            ApiErrorCategory::Validation
            | ApiErrorCategory::NotFound
            | ApiErrorCategory::Conflict
            | ApiErrorCategory::Client => ErrorSeverity::Info,
            ApiErrorCategory::Authentication | ApiErrorCategory::Authorization => {
                ErrorSeverity::Warning
            }
            ApiErrorCategory::Server | ApiErrorCategory::Decode => ErrorSeverity::Error,
            ApiErrorCategory::Storage | ApiErrorCategory::Config => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self.severity(), ErrorSeverity::Critical)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited(f) | Self::Server(f) => f.retry_after,
            _ => None,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Storage(message) => Self::Storage(message),
            SessionError::Expired(failure) => Self::SessionExpired(failure.to_string()),
        }
    }
}

impl From<KoshflowError> for ApiError {
    fn from(err: KoshflowError) -> Self {
        match err {
            KoshflowError::Config(message) | KoshflowError::InvalidInput(message) => {
                Self::Config(message)
            }
            KoshflowError::Network(message) => Self::Network(message),
            KoshflowError::Storage(message) => Self::Storage(message),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<ApiError> for KoshflowError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err.category() {
            ApiErrorCategory::Network
            | ApiErrorCategory::RateLimit
            | ApiErrorCategory::Server
            | ApiErrorCategory::Decode => Self::Network(message),
            ApiErrorCategory::Authentication | ApiErrorCategory::Authorization => {
                Self::Auth(message)
            }
            ApiErrorCategory::Validation
            | ApiErrorCategory::Conflict
            | ApiErrorCategory::Client => Self::InvalidInput(message),
            ApiErrorCategory::NotFound => Self::NotFound(message),
            ApiErrorCategory::Storage => Self::Storage(message),
            ApiErrorCategory::Config => Self::Config(message),
        }
    }
}

fn status_line_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("Request failed: {} {}", status.as_u16(), reason),
        None => format!("Request failed: {}", status.as_u16()),
    }
}

/// Body of a non-2xx response. An unreadable body is logged and read as
/// empty, leaving the status line as the message.
pub(crate) async fn read_failure_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => text,
        Err(err) => {
            debug!(error = %err, "Failed to read error response body");
            String::new()
        }
    }
}

/// `Retry-After` in delta-seconds form; HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
