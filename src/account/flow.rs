//! One-shot account creation.
//!
//! ## States
//!
//! `Idle -> Connecting -> Connected -> CreatingAccount -> {Succeeded, Failed} -> Terminated`
//!
//! Credentials are validated and saved before any network activity. The
//! client handle gets a background pump, then `connect` and `create_user`
//! run in order on the caller's task. Whatever happens once the handle
//! exists, it is aborted exactly once before control returns: the session
//! is never kept for a later login. The caller's reference is dropped and
//! the pump is signalled, which performs the final disconnect.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::auth::{save_config, Credentials};
use crate::connection::{SessionId, SessionRegistry};
use crate::error::{RpcnError, RpcnResult};
use crate::traits::{ClientError, CredentialsProvider, RpcnClient};

/// Avatar submitted with every new account.
pub const DEFAULT_AVATAR_URL: &str = "https://i.imgur.com/AfWIyQP.jpg";

/// A state of the account-creation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCreationState {
    Idle,
    Connecting,
    Connected,
    CreatingAccount,
    Succeeded,
    Failed,
    Terminated,
}

impl AccountCreationState {
    /// Returns a human-readable description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            AccountCreationState::Idle => "Validating input",
            AccountCreationState::Connecting => "Connecting",
            AccountCreationState::Connected => "Connected",
            AccountCreationState::CreatingAccount => "Creating account",
            AccountCreationState::Succeeded => "Account created",
            AccountCreationState::Failed => "Failed",
            AccountCreationState::Terminated => "Session closed",
        }
    }
}

impl fmt::Display for AccountCreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Tuning for the account-creation sequence.
///
/// Both timeouts default to `None`, in which case a hung server stalls the
/// caller until the transport gives up.
#[derive(Debug, Clone)]
pub struct AccountCreationOptions {
    /// Upper bound for `connect`.
    pub connect_timeout: Option<Duration>,
    /// Upper bound for `create_user`.
    pub request_timeout: Option<Duration>,
    /// Avatar submitted with the account.
    pub avatar_url: String,
    /// Display name; the NPID when `None`.
    pub online_name: Option<String>,
}

impl Default for AccountCreationOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            request_timeout: None,
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            online_name: None,
        }
    }
}

impl AccountCreationOptions {
    /// Bound `connect` by `timeout`.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Bound `create_user` by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Submit `url` as the avatar.
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = url.into();
        self
    }

    /// Register the account under a display name other than the NPID.
    pub fn with_online_name(mut self, name: impl Into<String>) -> Self {
        self.online_name = Some(name.into());
        self
    }
}

/// A created account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCreated {
    /// Server the account was created on.
    pub host: String,
    /// The new account's NPID.
    pub npid: String,
}

/// Full record of one run.
#[derive(Debug)]
pub struct AccountCreation {
    /// Every state entered, in order.
    pub transitions: Vec<AccountCreationState>,
    /// Registry entry of the pump, if the sequence got that far.
    pub session: Option<SessionId>,
    /// What the caller is told.
    pub result: RpcnResult<AccountCreated>,
}

impl AccountCreation {
    /// True if the account was created.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether `state` was ever entered.
    pub fn visited(&self, state: AccountCreationState) -> bool {
        self.transitions.contains(&state)
    }
}

/// Records state changes and logs them.
struct Transitions(Vec<AccountCreationState>);

impl Transitions {
    fn new() -> Self {
        Self(vec![AccountCreationState::Idle])
    }

    fn enter(&mut self, next: AccountCreationState) {
        if let Some(prev) = self.0.last() {
            debug!(from = ?prev, to = ?next, "Account creation transition");
        }
        self.0.push(next);
    }
}

/// Run `fut`, failing with `ClientError::Timeout` after `limit`.
async fn bounded<F>(limit: Option<Duration>, op: &str, fut: F) -> Result<(), ClientError>
where
    F: Future<Output = Result<(), ClientError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|_| Err(ClientError::Timeout(op.to_string()))),
        None => fut.await,
    }
}

/// Drives account creation against one credential store.
pub struct AccountCreator<P> {
    provider: P,
    registry: Arc<SessionRegistry>,
    options: AccountCreationOptions,
}

impl<P> AccountCreator<P>
where
    P: CredentialsProvider,
{
    /// Create a creator persisting to `provider` and registering pumps in
    /// `registry`.
    pub fn new(provider: P, registry: Arc<SessionRegistry>) -> Self {
        Self {
            provider,
            registry,
            options: AccountCreationOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: AccountCreationOptions) -> Self {
        self.options = options;
        self
    }

    /// The credential store runs are saved to.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The registry holding this creator's pumps.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Create an account and report only the outcome.
    pub async fn create_account<C>(
        &self,
        client: C,
        candidate: &Credentials,
    ) -> RpcnResult<AccountCreated>
    where
        C: RpcnClient + 'static,
    {
        self.run(client, candidate).await.result
    }

    /// Create an account using a fresh `client`.
    ///
    /// The client is taken by value so one handle never serves two attempts.
    pub async fn run<C>(&self, client: C, candidate: &Credentials) -> AccountCreation
    where
        C: RpcnClient + 'static,
    {
        let mut transitions = Transitions::new();
        self.registry.reap();

        if let Err(err) = save_config(&self.provider, candidate).await {
            warn!(code = err.error_code(), "Account creation rejected: {}", err);
            transitions.enter(AccountCreationState::Failed);
            transitions.enter(AccountCreationState::Terminated);
            return AccountCreation {
                transitions: transitions.0,
                session: None,
                result: Err(err),
            };
        }

        // Later edits to the caller's credentials must not reach this session
        let snapshot = candidate.clone();

        let handle = Arc::new(client);
        let session = self.registry.spawn_pump(handle.clone());

        let result = self.exchange(handle.as_ref(), &snapshot, &mut transitions).await;

        // One-shot session: tear it down on every path
        handle.abort().await;

        match &result {
            Ok(created) => {
                info!(npid = %created.npid, host = %created.host, "Account created");
                transitions.enter(AccountCreationState::Succeeded);
            }
            Err(err) => {
                warn!(code = err.error_code(), "Account creation failed: {}", err);
                transitions.enter(AccountCreationState::Failed);
            }
        }

        drop(handle);
        self.registry.release(session);
        transitions.enter(AccountCreationState::Terminated);

        AccountCreation {
            transitions: transitions.0,
            session: Some(session),
            result,
        }
    }

    async fn exchange<C>(
        &self,
        client: &C,
        creds: &Credentials,
        transitions: &mut Transitions,
    ) -> RpcnResult<AccountCreated>
    where
        C: RpcnClient + ?Sized,
    {
        transitions.enter(AccountCreationState::Connecting);
        bounded(self.options.connect_timeout, "connect", client.connect(&creds.host))
            .await
            .map_err(|source| RpcnError::ConnectFailed {
                host: creds.host.clone(),
                source,
            })?;
        transitions.enter(AccountCreationState::Connected);

        let online_name = self.options.online_name.as_deref().unwrap_or(&creds.npid);

        transitions.enter(AccountCreationState::CreatingAccount);
        bounded(
            self.options.request_timeout,
            "create_user",
            client.create_user(&creds.npid, &creds.password, online_name, &self.options.avatar_url),
        )
        .await
        .map_err(|source| RpcnError::CreateAccountFailed {
            npid: creds.npid.clone(),
            source,
        })?;

        Ok(AccountCreated {
            host: creds.host.clone(),
            npid: creds.npid.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ClientCall, InMemoryCredentials, MockRpcnClient};
    use crate::auth::ValidationError;
    use crate::connection::{PumpConfig, PumpExit};
    use crate::traits::{ConnectionState, ServerErrorKind};
    use AccountCreationState::*;

    fn creator() -> AccountCreator<InMemoryCredentials> {
        let config = PumpConfig::default().with_idle_interval(Duration::from_millis(1));
        let registry = SessionRegistry::shared(config);
        AccountCreator::new(InMemoryCredentials::new(), registry)
    }

    fn valid() -> Credentials {
        Credentials::new("rpcn.example.org", "Player_1", "secret123")
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CreatingAccount.to_string(), "Creating account");
        assert_eq!(Terminated.to_string(), "Session closed");
    }

    #[test]
    fn test_options_default() {
        let options = AccountCreationOptions::default();
        assert_eq!(options.avatar_url, DEFAULT_AVATAR_URL);
        assert!(options.connect_timeout.is_none());
        assert!(options.request_timeout.is_none());
        assert!(options.online_name.is_none());
    }

    #[tokio::test]
    async fn test_success_path() {
        let creator = creator();
        let client = MockRpcnClient::new();

        let run = creator.run(client.clone(), &valid()).await;
        assert!(run.succeeded());
        assert_eq!(
            run.transitions,
            vec![Idle, Connecting, Connected, CreatingAccount, Succeeded, Terminated]
        );
        assert_eq!(
            run.result.as_ref().unwrap(),
            &AccountCreated {
                host: "rpcn.example.org".to_string(),
                npid: "Player_1".to_string()
            }
        );

        let exit = creator.registry().join(run.session.unwrap()).await;
        assert!(matches!(exit, Some(PumpExit::Stopped) | Some(PumpExit::SoleOwner)));

        assert_eq!(client.state(), ConnectionState::Aborted);
        assert_eq!(client.abort_count(), 1);
        assert_eq!(client.disconnect_count(), 1);
        assert_eq!(
            client.calls(),
            vec![
                ClientCall::Connect {
                    host: "rpcn.example.org".to_string()
                },
                ClientCall::CreateUser {
                    npid: "Player_1".to_string(),
                    password: "secret123".to_string(),
                    online_name: "Player_1".to_string(),
                    avatar_url: DEFAULT_AVATAR_URL.to_string(),
                },
                ClientCall::Abort,
                ClientCall::Disconnect,
            ]
        );
        assert_eq!(creator.provider().stored(), Some(valid()));
    }

    #[tokio::test]
    async fn test_validation_failure_never_touches_network() {
        let creator = creator();
        let client = MockRpcnClient::new();

        let run = creator
            .run(client.clone(), &Credentials::new("rpcn.example.org", "ab", "pw"))
            .await;
        assert!(matches!(
            run.result,
            Err(RpcnError::Validation(ValidationError::InvalidUsernameFormat))
        ));
        assert_eq!(run.transitions, vec![Idle, Failed, Terminated]);
        assert!(run.session.is_none());
        assert!(client.calls().is_empty());
        assert!(creator.provider().stored().is_none());
        assert!(creator.registry().is_empty());
    }

    #[tokio::test]
    async fn test_connect_failure_aborts_without_create_user() {
        let creator = creator();
        let client = MockRpcnClient::new()
            .with_connect_error(ClientError::ConnectionFailed("refused".to_string()));

        let run = creator.run(client.clone(), &valid()).await;
        assert!(matches!(run.result, Err(RpcnError::ConnectFailed { .. })));
        assert_eq!(run.transitions, vec![Idle, Connecting, Failed, Terminated]);
        assert!(!client.create_user_called());
        assert_eq!(client.abort_count(), 1);
        assert_eq!(client.state(), ConnectionState::Aborted);

        creator.registry().join(run.session.unwrap()).await;
        assert_eq!(client.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_create_user_failure_aborts() {
        let creator = creator();
        let client = MockRpcnClient::new()
            .with_create_user_error(ClientError::Rejected(ServerErrorKind::UsernameTaken));

        let run = creator.run(client.clone(), &valid()).await;
        assert!(matches!(
            run.result,
            Err(RpcnError::CreateAccountFailed { .. })
        ));
        assert!(!run.visited(Succeeded));
        assert_eq!(client.abort_count(), 1);
        assert_eq!(client.state(), ConnectionState::Aborted);
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let options =
            AccountCreationOptions::default().with_connect_timeout(Duration::from_millis(10));
        let creator = creator().with_options(options);
        let client = MockRpcnClient::new().with_connect_delay(Duration::from_secs(5));

        let run = creator.run(client.clone(), &valid()).await;
        match run.result {
            Err(RpcnError::ConnectFailed { source, .. }) => {
                assert_eq!(source, ClientError::Timeout("connect".to_string()))
            }
            other => panic!("Expected ConnectFailed, got {:?}", other),
        }
        assert!(!client.create_user_called());
        assert_eq!(client.abort_count(), 1);
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let options =
            AccountCreationOptions::default().with_request_timeout(Duration::from_millis(10));
        let creator = creator().with_options(options);
        let client = MockRpcnClient::new().with_create_user_delay(Duration::from_secs(5));

        let run = creator.run(client.clone(), &valid()).await;
        assert!(matches!(
            run.result,
            Err(RpcnError::CreateAccountFailed {
                source: ClientError::Timeout(_),
                ..
            })
        ));
        assert_eq!(client.abort_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_online_name_and_avatar() {
        let creator = creator().with_options(
            AccountCreationOptions::default()
                .with_online_name("Display")
                .with_avatar_url("https://example.org/a.png"),
        );
        let client = MockRpcnClient::new();

        creator.create_account(client.clone(), &valid()).await.unwrap();
        assert!(client.calls().contains(&ClientCall::CreateUser {
            npid: "Player_1".to_string(),
            password: "secret123".to_string(),
            online_name: "Display".to_string(),
            avatar_url: "https://example.org/a.png".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_storage_failure_stops_before_network() {
        let creator = creator();
        creator.provider().set_save_should_fail(true);
        let client = MockRpcnClient::new();

        let err = creator.create_account(client.clone(), &valid()).await.unwrap_err();
        assert!(matches!(err, RpcnError::Storage(_)));
        assert!(client.calls().is_empty());
    }
}
