//! RPCN client capability.
//!
//! The account flow and the background pump only ever talk to the server
//! through this trait. Both call into the same client concurrently through
//! `&self`, so implementations must serialize access to their connection
//! internally.

use async_trait::async_trait;
use std::sync::Arc;

/// Lifecycle of one client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, never connected.
    Idle,
    /// Transport session established.
    Connected,
    /// Torn down gracefully.
    Disconnected,
    /// Torn down forcibly.
    Aborted,
}

impl ConnectionState {
    /// True for `Disconnected` and `Aborted`. A terminal session is never
    /// reused.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Aborted)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

/// Reason the server gave for refusing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerErrorKind {
    /// An account with this NPID already exists.
    UsernameTaken,
    /// The server rejected one of the submitted fields.
    InvalidInput,
    /// Any other server error token.
    Other(String),
}

impl ServerErrorKind {
    /// Map a server error token to a kind.
    pub fn from_token(token: &str) -> Self {
        match token {
            "CreationExistingUsername" | "UsernameTaken" => ServerErrorKind::UsernameTaken,
            "InvalidInput" | "Invalid" | "Malformed" => ServerErrorKind::InvalidInput,
            other => ServerErrorKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ServerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerErrorKind::UsernameTaken => write!(f, "username already exists"),
            ServerErrorKind::InvalidInput => write!(f, "invalid input"),
            ServerErrorKind::Other(token) => write!(f, "{}", token),
        }
    }
}

/// Client operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Could not establish the transport session.
    ConnectionFailed(String),
    /// The operation needs a connected session.
    NotConnected,
    /// The session was already disconnected or aborted.
    Terminated,
    /// The server refused the request.
    Rejected(ServerErrorKind),
    /// The server sent something we could not understand.
    Protocol(String),
    /// Writing to the transport failed.
    SendFailed(String),
    /// The operation did not complete in time.
    Timeout(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            ClientError::NotConnected => write!(f, "Not connected"),
            ClientError::Terminated => write!(f, "Session already terminated"),
            ClientError::Rejected(kind) => write!(f, "Rejected by server: {}", kind),
            ClientError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            ClientError::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            ClientError::Timeout(op) => write!(f, "Timed out during {}", op),
        }
    }
}

impl std::error::Error for ClientError {}

/// Network client for one RPCN session.
///
/// A client starts `Idle`, becomes `Connected` after a successful
/// `connect`, and ends `Disconnected` or `Aborted`. `disconnect` and
/// `abort` must be safe in any state, including before `connect`.
#[async_trait]
pub trait RpcnClient: Send + Sync {
    /// Open a transport session to `host`.
    async fn connect(&self, host: &str) -> Result<(), ClientError>;

    /// Register a new account.
    async fn create_user(
        &self,
        npid: &str,
        password: &str,
        online_name: &str,
        avatar_url: &str,
    ) -> Result<(), ClientError>;

    /// Drive one iteration of the connection's internal state machine.
    ///
    /// Called in a loop by the background pump; must return quickly when
    /// there is nothing to do.
    async fn manage_connection(&self);

    /// Graceful teardown. No-op when already terminal.
    async fn disconnect(&self);

    /// Forced teardown. Safe even if never connected.
    ///
    /// Always leaves the client `Aborted`, also when the server already
    /// closed the session.
    async fn abort(&self);

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;
}

/// Lets a caller keep its own reference to a client it hands to the
/// account flow.
#[async_trait]
impl<T> RpcnClient for Arc<T>
where
    T: RpcnClient + ?Sized,
{
    async fn connect(&self, host: &str) -> Result<(), ClientError> {
        (**self).connect(host).await
    }

    async fn create_user(
        &self,
        npid: &str,
        password: &str,
        online_name: &str,
        avatar_url: &str,
    ) -> Result<(), ClientError> {
        (**self)
            .create_user(npid, password, online_name, avatar_url)
            .await
    }

    async fn manage_connection(&self) {
        (**self).manage_connection().await
    }

    async fn disconnect(&self) {
        (**self).disconnect().await
    }

    async fn abort(&self) {
        (**self).abort().await
    }

    fn state(&self) -> ConnectionState {
        (**self).state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!ConnectionState::Idle.is_terminal());
        assert!(!ConnectionState::Connected.is_terminal());
        assert!(ConnectionState::Disconnected.is_terminal());
        assert!(ConnectionState::Aborted.is_terminal());
    }

    #[test]
    fn test_server_error_kind_from_token() {
        assert_eq!(
            ServerErrorKind::from_token("CreationExistingUsername"),
            ServerErrorKind::UsernameTaken
        );
        assert_eq!(
            ServerErrorKind::from_token("InvalidInput"),
            ServerErrorKind::InvalidInput
        );
        assert_eq!(
            ServerErrorKind::from_token("DbFail"),
            ServerErrorKind::Other("DbFail".to_string())
        );
    }

    #[test]
    fn test_client_error_display() {
        assert_eq!(
            ClientError::ConnectionFailed("refused".to_string()).to_string(),
            "Connection failed: refused"
        );
        assert_eq!(
            ClientError::Rejected(ServerErrorKind::UsernameTaken).to_string(),
            "Rejected by server: username already exists"
        );
        assert_eq!(ClientError::Terminated.to_string(), "Session already terminated");
    }
}
