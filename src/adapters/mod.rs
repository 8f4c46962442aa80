//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`WsRpcnClient`] - RPCN client over a WebSocket using tokio-tungstenite
//! - [`FileCredentialsProvider`] - File-based credentials storage
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockRpcnClient`] - Scripted client with a call log
//! - [`mock::InMemoryCredentials`] - In-memory credential storage

pub mod file_credentials;
pub mod mock;
pub mod ws_client;

pub use file_credentials::FileCredentialsProvider;
pub use mock::{ClientCall, InMemoryCredentials, MockRpcnClient};
pub use ws_client::{WsRpcnClient, WsRpcnClientConfig};
