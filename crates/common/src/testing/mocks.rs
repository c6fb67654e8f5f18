//! Mock implementations of platform-backed traits

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::security::{KeychainError, SecretStore};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// In-memory keychain with the same contract as
/// [`crate::security::KeychainProvider`].
///
/// Clones share storage, so a test can keep a handle while handing another
/// to the code under test.
#[derive(Clone, Debug)]
pub struct MockKeychainProvider {
    storage: StorageData,
    service_name: String,
    fail_access: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MockKeychainProvider {
    /// Create a new mock keychain provider with a service name for namespacing.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            storage: Arc::new(Mutex::new(HashMap::new())),
            service_name: service_name.into(),
            fail_access: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Service name this mock was created with.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Make every subsequent operation fail with `AccessFailed`.
    pub fn set_fail_access(&self, fail: bool) {
        self.fail_access.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `set_secret` and `delete_secret` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.storage.lock().clone()
    }

    fn check_access(&self) -> Result<(), KeychainError> {
        if self.fail_access.load(Ordering::SeqCst) {
            return Err(KeychainError::AccessFailed(format!(
                "mock keychain {} is locked",
                self.service_name
            )));
        }
        Ok(())
    }
}

impl Default for MockKeychainProvider {
    fn default() -> Self {
        Self::new("koshflow-test")
    }
}

impl SecretStore for MockKeychainProvider {
    fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        self.check_access()?;
        self.storage.lock().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<String, KeychainError> {
        self.check_access()?;
        self.storage.lock().get(key).cloned().ok_or(KeychainError::NotFound)
    }

    fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        self.check_access()?;
        self.storage.lock().remove(key);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn secret_exists(&self, key: &str) -> bool {
        self.storage.lock().contains_key(key)
    }
}
