//! Domain types and models
//!
//! Wire contracts shared by the session core, the HTTP infrastructure and the
//! CLI.

pub mod auth;
pub mod error_body;

pub use auth::{
    AuthResponse, Company, LoginRequest, LogoutRequest, ProfileResponse, RefreshRequest,
    RegisterRequest, TokenPair, User,
};
pub use error_body::{ErrorBody, FieldError};
