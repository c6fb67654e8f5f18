use std::time::Duration;

use anyhow::anyhow;
use koshflow_infra::{ApiError, ApiErrorCategory};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str =
    "koshflow=info,koshflow_app=info,koshflow_infra=info,koshflow_core=info";

/// Install the global subscriber. Logs go to stderr so stdout stays
/// machine-readable.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter());

    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

/// `RUST_LOG` when it parses, otherwise [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log the outcome of a command execution with structured fields.
///
/// `command` should be a stable identifier (e.g. `"auth::login"`), never
/// user input.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, error: Option<&anyhow::Error>) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    match error {
        None => info!(command, duration_ms, "command_execution_success"),
        Some(err) => {
            let error_type = err.downcast_ref::<ApiError>().map_or("other", error_label);
            warn!(command, duration_ms, error_type, "command_execution_failure");
        }
    }
}

/// Convert an `ApiError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &ApiError) -> &'static str {
    match error.category() {
        ApiErrorCategory::Network => "network",
        ApiErrorCategory::Validation => "validation",
        ApiErrorCategory::Authentication => "authentication",
        ApiErrorCategory::Authorization => "authorization",
        ApiErrorCategory::NotFound => "not_found",
        ApiErrorCategory::Conflict => "conflict",
        ApiErrorCategory::RateLimit => "rate_limit",
        ApiErrorCategory::Client => "client",
        ApiErrorCategory::Server => "server",
        ApiErrorCategory::Decode => "decode",
        ApiErrorCategory::Storage => "storage",
        ApiErrorCategory::Config => "config",
    }
}
