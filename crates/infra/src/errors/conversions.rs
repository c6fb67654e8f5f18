//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use koshflow_common::security::KeychainError;
use koshflow_core::SessionError;
use koshflow_domain::KoshflowError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KoshflowError);

impl From<InfraError> for KoshflowError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<KoshflowError> for InfraError {
    fn from(value: KoshflowError) -> Self {
        InfraError(value)
    }
}

impl From<InfraError> for SessionError {
    fn from(value: InfraError) -> Self {
        SessionError::Storage(value.0.to_string())
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoKoshflowError {
    fn into_koshflow(self) -> KoshflowError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → KoshflowError */
/* -------------------------------------------------------------------------- */

impl IntoKoshflowError for KeyringError {
    fn into_koshflow(self) -> KoshflowError {
        use KeyringError::{
            Ambiguous, BadEncoding, Invalid, NoEntry, NoStorageAccess, PlatformFailure, TooLong,
        };

        let description = self.to_string();

        match self {
            NoEntry => KoshflowError::NotFound("keychain entry not found".into()),
            BadEncoding(_) => {
                KoshflowError::Storage("credential in keychain is not valid UTF-8".into())
            }
            TooLong(name, limit) => KoshflowError::Storage(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                KoshflowError::Storage(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Ambiguous(entries) => KoshflowError::Storage(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => {
                KoshflowError::Storage(format!("keychain platform error: {err}"))
            }
            NoStorageAccess(err) => {
                KoshflowError::Storage(format!("unable to access secure storage: {err}"))
            }
            _ => KoshflowError::Storage(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_koshflow())
    }
}

/* -------------------------------------------------------------------------- */
/* KeychainError → KoshflowError */
/* -------------------------------------------------------------------------- */

impl IntoKoshflowError for KeychainError {
    fn into_koshflow(self) -> KoshflowError {
        match self {
            KeychainError::NotFound => KoshflowError::NotFound("keychain entry not found".into()),
            KeychainError::AccessFailed(message) => KoshflowError::Storage(message),
            KeychainError::Keyring(err) => err.into_koshflow(),
        }
    }
}

impl From<KeychainError> for InfraError {
    fn from(value: KeychainError) -> Self {
        InfraError(value.into_koshflow())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → KoshflowError */
/* -------------------------------------------------------------------------- */

impl IntoKoshflowError for std::io::Error {
    fn into_koshflow(self) -> KoshflowError {
        match self.kind() {
            std::io::ErrorKind::NotFound => KoshflowError::NotFound(self.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                KoshflowError::Storage(format!("permission denied: {self}"))
            }
            _ => KoshflowError::Storage(self.to_string()),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_koshflow())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → KoshflowError */
/* -------------------------------------------------------------------------- */

impl IntoKoshflowError for HttpError {
    fn into_koshflow(self) -> KoshflowError {
        if self.is_builder() {
            return KoshflowError::Config(format!("invalid HTTP client configuration: {self}"));
        }

        if self.is_timeout() {
            return KoshflowError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return KoshflowError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => KoshflowError::Auth(message),
                404 => KoshflowError::NotFound(message),
                400..=499 => KoshflowError::InvalidInput(message),
                _ => KoshflowError::Network(message),
            };
        }

        KoshflowError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_koshflow())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
