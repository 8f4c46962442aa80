//! rpcn-setup - store RPCN server credentials and create accounts
//!
//! This library exposes modules for use in integration tests.

pub mod account;
pub mod adapters;
pub mod auth;
pub mod cli;
pub mod connection;
pub mod error;
pub mod traits;
