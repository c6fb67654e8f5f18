//! Error classification shared by every layer.
//!
//! Module-specific error enums stay in their own crates; this trait gives
//! retry executors and logging a uniform way to ask "may I try again?" and
//! "how loud should this be?".

use std::fmt;
use std::time::Duration;

/// Trait for classifying errors by retryability and severity
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use koshflow_common::error::{ErrorClassification, ErrorSeverity};
///
/// #[derive(Debug)]
/// enum FetchError {
///     Busy,
///     Rejected,
/// }
///
/// impl ErrorClassification for FetchError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, Self::Busy)
///     }
///
///     fn severity(&self) -> ErrorSeverity {
///         match self {
///             Self::Busy => ErrorSeverity::Warning,
///             Self::Rejected => ErrorSeverity::Error,
///         }
///     }
///
///     fn is_critical(&self) -> bool {
///         false
///     }
///
///     fn retry_after(&self) -> Option<Duration> {
///         None
///     }
/// }
///
/// assert!(FetchError::Busy.is_retryable());
/// ```
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: timeouts, connection failures, rate
    /// limiting, temporary service unavailability.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the remote side asked for a specific
    /// delay (e.g. a `Retry-After` header).
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
