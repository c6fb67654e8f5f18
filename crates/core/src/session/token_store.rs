//! Current token pair, mirrored to durable storage

use std::sync::Arc;

use koshflow_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use koshflow_domain::TokenPair;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::error::SessionError;
use super::ports::TokenPersistence;

#[derive(Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// Single source of truth for the session's tokens.
///
/// Memory is updated before storage, so a persistence failure never leaves a
/// cleared token readable. Writers hold the lock for the whole update, which
/// keeps pair replacement atomic for readers.
pub struct TokenStore {
    tokens: RwLock<Tokens>,
    persistence: Arc<dyn TokenPersistence>,
}

impl TokenStore {
    pub fn new(persistence: Arc<dyn TokenPersistence>) -> Self {
        Self { tokens: RwLock::new(Tokens::default()), persistence }
    }

    /// Load persisted tokens into memory.
    ///
    /// Returns `true` when both tokens are present, which is the signal to
    /// rehydrate the session eagerly.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<bool, SessionError> {
        let access = self.persistence.load(ACCESS_TOKEN_KEY).await?;
        let refresh = self.persistence.load(REFRESH_TOKEN_KEY).await?;
        let complete = access.is_some() && refresh.is_some();

        let mut tokens = self.tokens.write().await;
        tokens.access = access;
        tokens.refresh = refresh;

        debug!(complete, "Token store initialized");
        Ok(complete)
    }

    pub async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.access.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().await.refresh.clone()
    }

    pub async fn has_refresh_token(&self) -> bool {
        self.tokens.read().await.refresh.is_some()
    }

    /// Both tokens, when both are present
    pub async fn pair(&self) -> Option<TokenPair> {
        let tokens = self.tokens.read().await;
        match (&tokens.access, &tokens.refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        }
    }

    /// Store or clear the access token. `None` clears the persisted value too.
    pub async fn set_access_token(&self, token: Option<String>) -> Result<(), SessionError> {
        let mut tokens = self.tokens.write().await;
        tokens.access.clone_from(&token);
        self.persist(ACCESS_TOKEN_KEY, token.as_deref()).await
    }

    /// Store or clear the refresh token. `None` clears the persisted value too.
    pub async fn set_refresh_token(&self, token: Option<String>) -> Result<(), SessionError> {
        let mut tokens = self.tokens.write().await;
        tokens.refresh.clone_from(&token);
        self.persist(REFRESH_TOKEN_KEY, token.as_deref()).await
    }

    /// Replace both tokens at once
    #[instrument(skip_all)]
    pub async fn set_pair(&self, pair: TokenPair) -> Result<(), SessionError> {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(pair.access_token.clone());
        tokens.refresh = Some(pair.refresh_token.clone());

        self.persist(ACCESS_TOKEN_KEY, Some(&pair.access_token)).await?;
        self.persist(REFRESH_TOKEN_KEY, Some(&pair.refresh_token)).await?;
        debug!("Token pair replaced");
        Ok(())
    }

    /// Remove both tokens from memory and storage.
    ///
    /// Both storage keys are attempted even if the first removal fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), SessionError> {
        let mut tokens = self.tokens.write().await;
        *tokens = Tokens::default();

        let access = self.persistence.remove(ACCESS_TOKEN_KEY).await;
        let refresh = self.persistence.remove(REFRESH_TOKEN_KEY).await;
        debug!("Token store cleared");
        access.and(refresh)
    }

    async fn persist(&self, key: &str, value: Option<&str>) -> Result<(), SessionError> {
        match value {
            Some(value) => self.persistence.store(key, value).await,
            None => self.persistence.remove(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::InMemoryTokenPersistence;

    fn store_with(backend: &InMemoryTokenPersistence) -> TokenStore {
        TokenStore::new(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn initialize_reports_complete_pair() {
        let backend =
            InMemoryTokenPersistence::with_entries([("token", "a1"), ("refreshToken", "r1")]);
        let store = store_with(&backend);

        assert!(store.initialize().await.unwrap());
        assert_eq!(store.pair().await, Some(TokenPair::new("a1", "r1")));
    }

    #[tokio::test]
    async fn initialize_with_only_access_token_is_incomplete() {
        let backend = InMemoryTokenPersistence::with_entries([("token", "a1")]);
        let store = store_with(&backend);

        assert!(!store.initialize().await.unwrap());
        assert_eq!(store.access_token().await.as_deref(), Some("a1"));
        assert!(!store.has_refresh_token().await);
    }

    #[tokio::test]
    async fn setting_none_removes_persisted_value() {
        let backend = InMemoryTokenPersistence::new();
        let store = store_with(&backend);

        store.set_access_token(Some("a1".into())).await.unwrap();
        store.set_refresh_token(Some("r1".into())).await.unwrap();
        store.set_access_token(None).await.unwrap();

        let persisted = backend.snapshot();
        assert!(!persisted.contains_key("token"));
        assert_eq!(persisted.get("refreshToken").map(String::as_str), Some("r1"));
        assert_eq!(store.access_token().await, None);
    }

    #[tokio::test]
    async fn clear_empties_memory_and_storage() {
        let backend = InMemoryTokenPersistence::new();
        let store = store_with(&backend);

        store.set_pair(TokenPair::new("a1", "r1")).await.unwrap();
        store.clear().await.unwrap();

        assert!(backend.snapshot().is_empty());
        assert_eq!(store.pair().await, None);
        assert_eq!(store.refresh_token().await, None);
    }
}
