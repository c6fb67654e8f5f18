//! Generic keychain provider for secure credential storage
//!
//! Thin wrapper over the platform keychain for storing arbitrary secrets
//! across macOS (Keychain Access), Windows (Credential Manager), and Linux
//! (Secret Service API).
//!
//! ## Usage
//!
//! ```no_run
//! use koshflow_common::security::{KeychainProvider, SecretStore};
//!
//! let keychain = KeychainProvider::new("KoshFlow.api");
//! keychain.set_secret("refreshToken", "opaque")?;
//! let secret = keychain.get_secret("refreshToken")?;
//! assert_eq!(secret, "opaque");
//! # Ok::<(), koshflow_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Synchronous key/value secret storage keyed by account name
///
/// Implementations must treat `delete_secret` on a missing key as success.
pub trait SecretStore: Send + Sync {
    /// Store a secret, replacing any previous value
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError>;

    /// Retrieve a secret or `KeychainError::NotFound`
    fn get_secret(&self, key: &str) -> Result<String, KeychainError>;

    /// Delete a secret (idempotent)
    fn delete_secret(&self, key: &str) -> Result<(), KeychainError>;

    /// Whether a secret is present
    fn secret_exists(&self, key: &str) -> bool {
        self.get_secret(key).is_ok()
    }
}

/// Generic keychain provider for secure credential storage
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    /// Create a new keychain provider for a specific service
    ///
    /// # Examples
    /// ```
    /// use koshflow_common::security::KeychainProvider;
    ///
    /// let keychain = KeychainProvider::new("KoshFlow.api");
    /// assert_eq!(keychain.service_name(), "KoshFlow.api");
    /// ```
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    /// Service identifier entries are namespaced under
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn create_entry(&self, account: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, account).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }
}

impl SecretStore for KeychainProvider {
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {key}: {e}"))
        })
    }

    fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        entry.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => KeychainError::NotFound,
            other => {
                KeychainError::AccessFailed(format!("Failed to retrieve secret for {key}: {other}"))
            }
        })
    }

    fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {key}: {e}"
            ))),
        }
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, not available, etc.)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Entry not found in keychain
    #[error("Entry not found")]
    NotFound,

    /// Underlying keyring library error
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockKeychainProvider;

    #[test]
    fn provider_keeps_service_name() {
        let keychain = KeychainProvider::new("test-service");
        assert_eq!(keychain.service_name(), "test-service");
    }

    /// Default `secret_exists` goes through `get_secret`, so a store that
    /// only implements the required methods still answers presence checks.
    #[test]
    fn secret_exists_defaults_to_lookup() {
        struct Fixed;

        impl SecretStore for Fixed {
            fn set_secret(&self, _key: &str, _value: &str) -> Result<(), KeychainError> {
                Ok(())
            }

            fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
                if key == "present" {
                    Ok("v".into())
                } else {
                    Err(KeychainError::NotFound)
                }
            }

            fn delete_secret(&self, _key: &str) -> Result<(), KeychainError> {
                Ok(())
            }
        }

        assert!(Fixed.secret_exists("present"));
        assert!(!Fixed.secret_exists("absent"));
    }

    #[test]
    fn mock_set_get_and_delete_secret() {
        let keychain = MockKeychainProvider::new("KoshFlowTest.unit");

        keychain.set_secret("token", "abc").unwrap();
        assert!(keychain.secret_exists("token"));
        assert_eq!(keychain.get_secret("token").unwrap(), "abc");

        keychain.delete_secret("token").unwrap();
        keychain.delete_secret("token").unwrap();
        assert!(matches!(keychain.get_secret("token"), Err(KeychainError::NotFound)));
    }
}
