//! Platform keychain token persistence

use std::sync::Arc;

use async_trait::async_trait;
use koshflow_common::security::{KeychainError, SecretStore};
use koshflow_core::{SessionError, TokenPersistence};

use crate::errors::InfraError;

/// Stores each token as its own keychain entry under the configured service.
///
/// Keychain calls block, so they run on the blocking pool.
pub struct KeychainTokenPersistence<S> {
    store: Arc<S>,
}

impl<S: SecretStore + 'static> KeychainTokenPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store: Arc::new(store) }
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, KeychainError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| SessionError::Storage(format!("keychain task failed: {e}")))?
            .map_err(|e| SessionError::from(InfraError::from(e)))
    }
}

#[async_trait]
impl<S: SecretStore + 'static> TokenPersistence for KeychainTokenPersistence<S> {
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        let key = key.to_string();
        self.blocking(move |store| match store.get_secret(&key) {
            Ok(value) => Ok(Some(value)),
            Err(KeychainError::NotFound) => Ok(None),
            Err(err) => Err(err),
        })
        .await
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let (key, value) = (key.to_string(), value.to_string());
        self.blocking(move |store| store.set_secret(&key, &value)).await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        let key = key.to_string();
        self.blocking(move |store| store.delete_secret(&key)).await
    }
}
