//! JSON file token persistence for headless environments

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use koshflow_core::{SessionError, TokenPersistence};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::InfraError;

type Entries = BTreeMap<String, String>;

/// Tokens in one JSON object, e.g. `{"token": "...", "refreshToken": "..."}`.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash never leaves a truncated file. The temp file is created `0600` on
/// Unix.
pub struct FileTokenPersistence {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries, SessionError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => return Err(InfraError::from(err).into()),
        };
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&contents).map_err(|e| {
            SessionError::Storage(format!("corrupt token file {}: {e}", self.path.display()))
        })
    }

    async fn write_entries(&self, entries: &Entries) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| SessionError::Storage(format!("failed to encode tokens: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = create_private(&tmp).await.map_err(InfraError::from)?;
        file.write_all(&json).await.map_err(InfraError::from)?;
        file.sync_all().await.map_err(InfraError::from)?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await.map_err(InfraError::from)?;

        debug!(path = %self.path.display(), "Token file written");
        Ok(())
    }

    async fn update<F>(&self, mutate: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Entries) -> bool + Send,
    {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if mutate(&mut entries) {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

/// Create `path` empty and owner-only before any bytes are written. A
/// leftover file from an interrupted write is removed first.
async fn create_private(path: &Path) -> std::io::Result<tokio::fs::File> {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            return Err(err);
        }
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}

#[async_trait]
impl TokenPersistence for FileTokenPersistence {
    async fn load(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(|entries| {
            if entries.get(key).map(String::as_str) == Some(value) {
                return false;
            }
            entries.insert(key.to_string(), value.to_string());
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|entries| entries.remove(key).is_some()).await
    }
}
