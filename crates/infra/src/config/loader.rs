//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Environment variables, when `KOSHFLOW_API_URL` is set
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//! 3. Otherwise built-in defaults
//!
//! ## Environment Variables
//! - `KOSHFLOW_API_URL`: API base URL (required for the environment path)
//! - `KOSHFLOW_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `KOSHFLOW_RETRY_MAX_ATTEMPTS`: Total attempts for retryable failures
//! - `KOSHFLOW_RETRY_BASE_DELAY_MS`: First backoff delay
//! - `KOSHFLOW_RETRY_MAX_DELAY_MS`: Backoff cap
//! - `KOSHFLOW_STORAGE_BACKEND`: `keychain`, `file` or `memory`
//! - `KOSHFLOW_STORAGE_PATH`: Token file for the `file` backend
//! - `KOSHFLOW_KEYCHAIN_SERVICE`: Keychain service name
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./koshflow.toml`, `./koshflow.json`, `./config.toml`, `./config.json`
//! 2. The same names in the user config directory (`.../koshflow/`)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use koshflow_domain::{Config, KoshflowError, Result, StorageBackend};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["koshflow.toml", "koshflow.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `KoshflowError::Config` if environment values are malformed or
/// a discovered config file cannot be parsed. A missing file is not an
/// error; defaults are used instead.
pub fn load() -> Result<Config> {
    if std::env::var_os("KOSHFLOW_API_URL").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// Load configuration from environment variables
///
/// `KOSHFLOW_API_URL` is required; every other variable falls back to its
/// default.
///
/// # Errors
/// Returns `KoshflowError::Config` if the URL is missing or a value does not
/// parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.api.base_url = env_var("KOSHFLOW_API_URL")?;
    if let Some(timeout) = env_parse::<u64>("KOSHFLOW_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }

    if let Some(attempts) = env_parse::<u32>("KOSHFLOW_RETRY_MAX_ATTEMPTS")? {
        config.retry.max_attempts = attempts;
    }
    if let Some(delay) = env_parse::<u64>("KOSHFLOW_RETRY_BASE_DELAY_MS")? {
        config.retry.base_delay_ms = delay;
    }
    if let Some(delay) = env_parse::<u64>("KOSHFLOW_RETRY_MAX_DELAY_MS")? {
        config.retry.max_delay_ms = delay;
    }

    if let Ok(backend) = std::env::var("KOSHFLOW_STORAGE_BACKEND") {
        config.storage.backend = StorageBackend::from_str(&backend).map_err(KoshflowError::Config)?;
    }
    if let Some(path) = std::env::var_os("KOSHFLOW_STORAGE_PATH") {
        config.storage.path = Some(PathBuf::from(path));
    }
    if let Ok(service) = std::env::var("KOSHFLOW_KEYCHAIN_SERVICE") {
        config.storage.keychain_service = service;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `KoshflowError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KoshflowError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KoshflowError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KoshflowError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KoshflowError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KoshflowError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(KoshflowError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(project) = ProjectDirs::from("com", "KoshFlow", "koshflow") {
        dirs.push(project.config_dir().to_path_buf());
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| KoshflowError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| KoshflowError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
