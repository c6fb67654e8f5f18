//! KoshFlow API client
//!
//! - [`client`]: request dispatcher with bearer injection and the single
//!   refresh-and-retry path for unauthorized responses
//! - [`auth`]: login/register/logout, session rehydration, the HTTP refresh
//!   call
//! - [`errors`]: status-mapped error taxonomy
//! - [`retry`]: caller-level exponential backoff
//! - [`resources`]: accounting resource and report endpoints

pub mod auth;
pub mod client;
pub mod errors;
pub mod resources;
pub mod retry;

pub use auth::{AuthService, HttpRefreshTransport};
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig, RequestOptions};
pub use errors::{ApiError, ApiErrorCategory, HttpFailure};
pub use resources::{fetch_report, ReportKind, Resource, ResourceApi};
pub use retry::{retry_config, ApiRetry};
