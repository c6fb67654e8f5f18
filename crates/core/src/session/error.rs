//! Session error types

use std::time::Duration;

use koshflow_common::{ErrorClassification, ErrorSeverity};
use koshflow_domain::KoshflowError;
use thiserror::Error;

/// Errors raised by the token store and its persistence port
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Durable token storage could not be read or written
    #[error("token storage failed: {0}")]
    Storage(String),

    /// The refresh call failed and the session was torn down
    #[error("session expired: {0}")]
    Expired(#[from] RefreshFailure),
}

/// Why a refresh did not produce a new token pair.
///
/// `Clone` because one failure is handed to every caller attached to the
/// in-flight refresh.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshFailure {
    /// The refresh endpoint answered with a non-2xx status
    #[error("refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// No response from the refresh endpoint
    #[error("refresh request failed: {0}")]
    Transport(String),

    /// 2xx response without a usable token pair
    #[error("refresh response could not be decoded: {0}")]
    InvalidResponse(String),

    /// The rotated pair could not be persisted
    #[error("refreshed tokens could not be stored: {0}")]
    Storage(String),

    /// The refresh token disappeared before the refresh started
    #[error("no refresh token available")]
    MissingRefreshToken,
}

impl ErrorClassification for SessionError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Storage(_) => ErrorSeverity::Error,
            Self::Expired(_) => ErrorSeverity::Warning,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl From<SessionError> for KoshflowError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Storage(msg) => Self::Storage(msg),
            SessionError::Expired(failure) => Self::Auth(failure.to_string()),
        }
    }
}
