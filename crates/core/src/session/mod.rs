//! Authenticated session state
//!
//! Control flow on an unauthorized response: dispatcher ->
//! [`refresh::RefreshCoordinator`] -> [`token_store::TokenStore`] update ->
//! dispatcher retry.

pub mod error;
pub mod memory;
pub mod ports;
pub mod refresh;
pub mod token_store;
