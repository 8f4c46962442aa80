//! Command handlers.
//!
//! Handlers return values instead of printing so `main` owns all output.

use crate::account::{AccountCreated, AccountCreator};
use crate::auth::{save_config, Credentials};
use crate::error::{RpcnError, RpcnResult};
use crate::traits::{CredentialsProvider, RpcnClient};

use super::args::CredentialOverrides;

/// Render stored credentials for `show`, masking the password.
pub fn render_credentials(creds: &Credentials) -> String {
    let password = if creds.password.is_empty() {
        "(not set)".to_string()
    } else {
        creds.masked_password()
    };
    let or_unset = |value: &str| {
        if value.is_empty() {
            "(not set)".to_string()
        } else {
            value.to_string()
        }
    };

    format!(
        "Host:     {}\nNPID:     {}\nPassword: {}",
        or_unset(&creds.host),
        or_unset(&creds.npid),
        password
    )
}

/// Prompt for a password on the terminal without echo.
pub fn prompt_password() -> RpcnResult<String> {
    rpassword::prompt_password("Password: ").map_err(RpcnError::Input)
}

/// Merge overrides over the stored configuration.
pub async fn resolve_credentials<P>(
    provider: &P,
    overrides: &CredentialOverrides,
) -> RpcnResult<Credentials>
where
    P: CredentialsProvider + ?Sized,
{
    let stored = provider.load_or_default().await?;
    let mut creds = overrides.apply(stored);
    if overrides.ask_password {
        creds.password = prompt_password()?;
    }
    Ok(creds)
}

/// `show`: load the stored configuration.
pub async fn handle_show<P>(provider: &P) -> RpcnResult<Credentials>
where
    P: CredentialsProvider + ?Sized,
{
    Ok(provider.load_or_default().await?)
}

/// `save`: validate and store.
pub async fn handle_save<P>(
    provider: &P,
    overrides: &CredentialOverrides,
) -> RpcnResult<Credentials>
where
    P: CredentialsProvider + ?Sized,
{
    let creds = resolve_credentials(provider, overrides).await?;
    save_config(provider, &creds).await?;
    Ok(creds)
}

/// `create-account`: store, then run the one-shot account flow.
pub async fn handle_create_account<P, C>(
    creator: &AccountCreator<P>,
    client: C,
    overrides: &CredentialOverrides,
) -> RpcnResult<AccountCreated>
where
    P: CredentialsProvider,
    C: RpcnClient + 'static,
{
    let creds = resolve_credentials(creator.provider(), overrides).await?;
    creator.create_account(client, &creds).await
}

/// `reset`: remove the stored configuration.
pub async fn handle_reset<P>(provider: &P) -> RpcnResult<()>
where
    P: CredentialsProvider + ?Sized,
{
    Ok(provider.clear().await?)
}
