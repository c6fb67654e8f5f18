//! Resilience patterns for transient failures
//!
//! This module provides a **generic** retry executor: exponential or fixed
//! backoff, optional jitter, a bounded attempt count and a pluggable
//! [`RetryPolicy`] deciding which errors deserve another attempt.
//!
//! The executor knows nothing about HTTP. Callers classify their own errors,
//! usually through [`policies::ClassifiedRetry`], which defers to
//! [`crate::error::ErrorClassification`].
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use koshflow_common::resilience::{policies::AlwaysRetry, RetryConfig, RetryExecutor};
//!
//! # tokio_test::block_on(async {
//! let config = RetryConfig::builder()
//!     .max_attempts(3)
//!     .exponential_backoff(Duration::from_millis(1), 2.0, Duration::from_millis(4))
//!     .no_jitter()
//!     .build()?;
//!
//! let executor = RetryExecutor::new(config, AlwaysRetry);
//! let value = executor.execute(|| async { Ok::<_, String>(42) }).await;
//! assert_eq!(value.ok(), Some(42));
//! # Ok::<(), koshflow_common::resilience::RetryError<()>>(())
//! # }).unwrap();
//! ```

pub mod retry;

pub use retry::{
    policies, retry_with_policy, BackoffStrategy, Jitter, RetryConfig, RetryConfigBuilder,
    RetryDecision, RetryError, RetryExecutor, RetryOutcome, RetryPolicy, RetryResult,
};
