//! Process-local token persistence

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::SessionError;
use super::ports::TokenPersistence;

/// [`TokenPersistence`] backed by a map. Clones share contents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenPersistence {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryTokenPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing values
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { entries: Arc::new(Mutex::new(map)) }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl TokenPersistence for InMemoryTokenPersistence {
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
