//! Application constants
//!
//! Centralized location for endpoint paths, persistence keys and
//! configuration defaults shared by every crate in the workspace.

// Persistence keys (durable key-value storage)
pub const ACCESS_TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

// Auth endpoints
pub const AUTH_LOGIN_PATH: &str = "/auth/login";
pub const AUTH_REGISTER_PATH: &str = "/auth/register";
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh";
pub const AUTH_LOGOUT_PATH: &str = "/auth/logout";
pub const AUTH_PROFILE_PATH: &str = "/auth/me";

// Configuration defaults
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "KoshFlow.api";
pub const DEFAULT_TOKEN_FILE_NAME: &str = "session.json";
pub const USER_AGENT: &str = concat!("koshflow-client/", env!("CARGO_PKG_VERSION"));
