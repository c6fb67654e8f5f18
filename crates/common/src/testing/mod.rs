//! Testing utilities and helpers
//!
//! - **[`mocks`]**: in-memory doubles for platform integrations
//!
//! ## Usage
//!
//! ```rust
//! use koshflow_common::security::SecretStore;
//! use koshflow_common::testing::MockKeychainProvider;
//!
//! let keychain = MockKeychainProvider::new("KoshFlowTest.doc");
//! keychain.set_secret("token", "value").unwrap();
//! assert_eq!(keychain.get_secret("token").unwrap(), "value");
//! ```

pub mod mocks;

pub use mocks::MockKeychainProvider;
