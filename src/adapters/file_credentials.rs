//! File-based credentials provider adapter.
//!
//! Wraps [`CredentialsManager`] behind the [`CredentialsProvider`] trait.

use async_trait::async_trait;
use std::path::Path;

use crate::auth::credentials::{Credentials, CredentialsManager};
use crate::traits::{CredentialsError, CredentialsProvider};

/// File-based credentials provider.
///
/// Credentials are stored in `~/.rpcn/rpcn.json` unless `RPCN_CONFIG_DIR`
/// points elsewhere.
#[derive(Debug, Clone)]
pub struct FileCredentialsProvider {
    manager: CredentialsManager,
}

impl FileCredentialsProvider {
    /// Create a provider for the default location.
    pub fn new() -> Result<Self, CredentialsError> {
        CredentialsManager::new()
            .map(Self::from_manager)
            .ok_or(CredentialsError::NoConfigDir)
    }

    /// Create a provider around an existing manager.
    pub fn from_manager(manager: CredentialsManager) -> Self {
        Self { manager }
    }

    /// Get a reference to the underlying credentials manager.
    pub fn manager(&self) -> &CredentialsManager {
        &self.manager
    }

    /// Get the path to the credentials file.
    pub fn credentials_path(&self) -> &Path {
        self.manager.credentials_path()
    }
}

#[async_trait]
impl CredentialsProvider for FileCredentialsProvider {
    async fn load(&self) -> Result<Option<Credentials>, CredentialsError> {
        self.manager
            .read()
            .map_err(|e| CredentialsError::LoadFailed(e.to_string()))
    }

    async fn save(&self, creds: &Credentials) -> Result<(), CredentialsError> {
        self.manager
            .save(creds)
            .map_err(|e| CredentialsError::SaveFailed(e.to_string()))
    }

    async fn clear(&self) -> Result<(), CredentialsError> {
        self.manager
            .clear()
            .map_err(|e| CredentialsError::ClearFailed(e.to_string()))
    }
}
