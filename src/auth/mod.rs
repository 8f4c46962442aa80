//! Credential handling for the RPCN configuration.
//!
//! This module provides:
//! - Credentials storage on disk
//! - Validation rules for host, NPID and password
//! - The validate-then-save step behind "save & close"

pub mod credentials;
pub mod validation;

pub use credentials::{Credentials, CredentialsManager, CONFIG_DIR_ENV};
pub use validation::{is_valid_npid, validate, ValidationError};

use crate::error::{RpcnError, RpcnResult};
use crate::traits::CredentialsProvider;

/// Validate `candidate` and persist it.
///
/// On a validation failure nothing is written and the violated rule is
/// returned.
pub async fn save_config<P>(provider: &P, candidate: &Credentials) -> RpcnResult<()>
where
    P: CredentialsProvider + ?Sized,
{
    validate(candidate)?;
    provider.save(candidate).await.map_err(RpcnError::Storage)
}
