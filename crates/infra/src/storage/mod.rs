//! Token persistence backends
//!
//! Each backend implements [`koshflow_core::TokenPersistence`]; the
//! configured one is picked by [`build_persistence`].

pub mod file;
pub mod keychain;

use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use koshflow_common::security::KeychainProvider;
use koshflow_core::{InMemoryTokenPersistence, TokenPersistence};
use koshflow_domain::constants::DEFAULT_TOKEN_FILE_NAME;
use koshflow_domain::{KoshflowError, StorageBackend, StorageConfig};
use tracing::debug;

pub use file::FileTokenPersistence;
pub use keychain::KeychainTokenPersistence;

/// Instantiate the backend named by `config`.
///
/// # Errors
/// Returns `KoshflowError::Config` when the file backend has no explicit
/// path and no user config directory can be determined.
pub fn build_persistence(
    config: &StorageConfig,
) -> Result<Arc<dyn TokenPersistence>, KoshflowError> {
    debug!(backend = ?config.backend, "Selecting token persistence");
    let persistence: Arc<dyn TokenPersistence> = match config.backend {
        StorageBackend::Keychain => Arc::new(KeychainTokenPersistence::new(KeychainProvider::new(
            config.keychain_service.clone(),
        ))),
        StorageBackend::File => {
            let path = match &config.path {
                Some(path) => path.clone(),
                None => default_token_path()?,
            };
            Arc::new(FileTokenPersistence::new(path))
        }
        StorageBackend::Memory => Arc::new(InMemoryTokenPersistence::new()),
    };
    Ok(persistence)
}

/// `<user config dir>/koshflow/session.json`
pub fn default_token_path() -> Result<PathBuf, KoshflowError> {
    ProjectDirs::from("com", "KoshFlow", "koshflow")
        .map(|dirs| dirs.config_dir().join(DEFAULT_TOKEN_FILE_NAME))
        .ok_or_else(|| {
            KoshflowError::Config("could not determine a config directory for token storage".into())
        })
}
