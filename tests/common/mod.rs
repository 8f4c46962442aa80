//! Shared fixtures for integration tests.

#![allow(dead_code)]

use rpcn_setup::adapters::FileCredentialsProvider;
use rpcn_setup::auth::{Credentials, CredentialsManager};
use rpcn_setup::connection::{PumpConfig, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Credentials that pass validation.
pub fn valid_credentials() -> Credentials {
    Credentials::new("rpcn.example.org:31313", "Player_1", "secret123")
}

/// A file-backed provider rooted in `temp_dir`.
pub fn temp_provider(temp_dir: &TempDir) -> FileCredentialsProvider {
    let manager = CredentialsManager::with_path(temp_dir.path().join("rpcn.json"));
    FileCredentialsProvider::from_manager(manager)
}

/// A registry whose pumps spin fast enough for short tests.
pub fn fast_registry() -> Arc<SessionRegistry> {
    SessionRegistry::shared(PumpConfig::default().with_idle_interval(Duration::from_millis(1)))
}
