//! Platform secret storage
//!
//! [`KeychainProvider`] wraps the OS keychain. [`SecretStore`] is the seam
//! consumers program against so tests can swap in
//! `testing::MockKeychainProvider`.

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider, SecretStore};
