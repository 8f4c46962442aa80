//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`RpcnClient`] - Network client session used by the account flow
//! - [`CredentialsProvider`] - Credentials storage and retrieval

pub mod client;
pub mod credentials;

pub use client::{ClientError, ConnectionState, RpcnClient, ServerErrorKind};
pub use credentials::{CredentialsError, CredentialsProvider};
