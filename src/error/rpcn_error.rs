//! Unified error type for the RPCN configuration tool.
//!
//! Every failure of the save and create-account actions ends up here, with
//! the title and message the user sees.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::auth::ValidationError;
use crate::traits::{ClientError, CredentialsError};

/// Title shown after a successful account creation.
pub const ACCOUNT_CREATED_TITLE: &str = "Account created!";

/// Message shown after a successful account creation.
pub const ACCOUNT_CREATED_MESSAGE: &str = "Your account has been created successfully!";

/// Unified error type.
#[derive(Debug, Error)]
pub enum RpcnError {
    /// Input rejected before any network activity.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The transport session could not be opened.
    #[error("failed to connect to {host}: {source}")]
    ConnectFailed {
        host: String,
        #[source]
        source: ClientError,
    },

    /// The server did not create the account.
    #[error("failed to create account {npid}: {source}")]
    CreateAccountFailed {
        npid: String,
        #[source]
        source: ClientError,
    },

    /// Reading or writing the stored configuration failed.
    #[error("credential storage error: {0}")]
    Storage(#[from] CredentialsError),

    /// Reading interactive input failed.
    #[error("failed to read input: {0}")]
    Input(#[source] std::io::Error),
}

impl RpcnError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RpcnError::Validation(_) => ErrorCategory::User,
            RpcnError::ConnectFailed { .. } => ErrorCategory::Network,
            RpcnError::CreateAccountFailed { source, .. } => match source {
                ClientError::Rejected(_) => ErrorCategory::Server,
                _ => ErrorCategory::Network,
            },
            RpcnError::Storage(CredentialsError::NoConfigDir) => ErrorCategory::Configuration,
            RpcnError::Storage(_) | RpcnError::Input(_) => ErrorCategory::System,
        }
    }

    /// Always `false`: no operation in this crate is retried automatically.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Short title for a message box.
    pub fn title(&self) -> &'static str {
        match self {
            RpcnError::Validation(err) => err.title(),
            RpcnError::ConnectFailed { .. } => "Error Connecting",
            RpcnError::CreateAccountFailed { .. } => "Error Creating Account",
            RpcnError::Storage(_) => "Error Saving Configuration",
            RpcnError::Input(_) => "Input error",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            RpcnError::Validation(err) => err.user_message().to_string(),
            RpcnError::ConnectFailed { .. } => "Failed to connect to RPCN server".to_string(),
            RpcnError::CreateAccountFailed { .. } => {
                "Failed to create the account (username exists?)".to_string()
            }
            RpcnError::Storage(err) => err.to_string(),
            RpcnError::Input(err) => format!("Could not read input: {}", err),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            RpcnError::Validation(err) => err.error_code(),
            RpcnError::ConnectFailed { .. } => "CONNECT_FAILED",
            RpcnError::CreateAccountFailed { .. } => "CREATE_ACCOUNT_FAILED",
            RpcnError::Storage(_) => "STORAGE_ERROR",
            RpcnError::Input(_) => "INPUT_ERROR",
        }
    }

    /// Text printed for the user: `title: message`, then a recovery hint.
    pub fn report(&self) -> String {
        format!(
            "{}: {}\n{}",
            self.title(),
            self.user_message(),
            self.category().recovery_hint()
        )
    }

    /// True if the error happened before any network activity.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            RpcnError::Validation(_) | RpcnError::Storage(_) | RpcnError::Input(_)
        )
    }
}
