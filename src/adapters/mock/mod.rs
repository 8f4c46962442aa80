//! Test doubles for the trait abstractions.
//!
//! - [`MockRpcnClient`] - Scripted network client with a call log
//! - [`InMemoryCredentials`] - In-memory credential storage

pub mod client;
pub mod credentials;

pub use client::{ClientCall, MockRpcnClient};
pub use credentials::InMemoryCredentials;
