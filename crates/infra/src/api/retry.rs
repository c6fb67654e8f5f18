//! Caller-level retry for API operations
//!
//! Wraps a whole operation (including its 401/refresh handling) in the
//! common retry executor. Classification comes from [`ApiError`]: 429, 5xx,
//! network errors and timeouts are retried, every other 4xx is terminal.

use std::future::Future;
use std::time::Duration;

use koshflow_common::resilience::policies::ClassifiedRetry;
use koshflow_common::resilience::{RetryConfig, RetryError, RetryExecutor};
use koshflow_domain::RetrySettings;

use super::errors::ApiError;

/// Exponential backoff doubling from `base_delay_ms`, capped at
/// `max_delay_ms`.
pub fn retry_config(settings: &RetrySettings) -> Result<RetryConfig, ApiError> {
    RetryConfig::builder()
        .max_attempts(settings.max_attempts)
        .exponential_backoff(
            Duration::from_millis(settings.base_delay_ms),
            2.0,
            Duration::from_millis(settings.max_delay_ms),
        )
        .equal_jitter()
        .unlimited_time()
        .build()
        .map_err(|e| ApiError::Config(e.to_string()))
}

/// Retry executor specialised for [`ApiError`]
pub struct ApiRetry {
    executor: RetryExecutor<ClassifiedRetry>,
}

impl ApiRetry {
    pub fn new(config: RetryConfig) -> Self {
        Self { executor: RetryExecutor::new(config, ClassifiedRetry) }
    }

    pub fn from_settings(settings: &RetrySettings) -> Result<Self, ApiError> {
        Ok(Self::new(retry_config(settings)?))
    }

    /// Run `operation` until it succeeds, fails terminally or runs out of
    /// attempts. The last classified error is returned on failure.
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.executor.execute(operation).await.map_err(into_api_error)
    }
}

fn into_api_error(err: RetryError<ApiError>) -> ApiError {
    match err {
        RetryError::AttemptsExhausted { source, .. } | RetryError::NonRetryable { source } => {
            source
        }
        RetryError::TimeoutExceeded { source: Some(source), .. } => source,
        RetryError::TimeoutExceeded { elapsed, source: None } => ApiError::Timeout(elapsed),
        RetryError::InvalidConfiguration { message } => ApiError::Config(message),
    }
}
