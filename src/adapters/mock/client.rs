//! Scripted RPCN client for testing.
//!
//! Records every protocol call in order and counts pump iterations so tests
//! can check ordering and teardown guarantees without a server.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::traits::{ClientError, ConnectionState, RpcnClient};

/// A protocol call observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Connect {
        host: String,
    },
    CreateUser {
        npid: String,
        password: String,
        online_name: String,
        avatar_url: String,
    },
    Disconnect,
    Abort,
}

#[derive(Debug)]
struct MockState {
    state: ConnectionState,
    connect_result: Result<(), ClientError>,
    create_user_result: Result<(), ClientError>,
    connect_delay: Option<Duration>,
    create_user_delay: Option<Duration>,
    calls: Vec<ClientCall>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<MockState>,
    manage_calls: AtomicUsize,
    manage_after_disconnect: AtomicUsize,
    disconnect_calls: AtomicUsize,
    abort_calls: AtomicUsize,
}

/// Scripted client. Clones share state.
#[derive(Debug, Clone)]
pub struct MockRpcnClient {
    inner: Arc<Inner>,
}

impl Default for MockRpcnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRpcnClient {
    /// A client whose `connect` and `create_user` both succeed.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(MockState {
                    state: ConnectionState::Idle,
                    connect_result: Ok(()),
                    create_user_result: Ok(()),
                    connect_delay: None,
                    create_user_delay: None,
                    calls: Vec::new(),
                }),
                manage_calls: AtomicUsize::new(0),
                manage_after_disconnect: AtomicUsize::new(0),
                disconnect_calls: AtomicUsize::new(0),
                abort_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Make `connect` fail with `err`.
    pub fn with_connect_error(self, err: ClientError) -> Self {
        self.lock().connect_result = Err(err);
        self
    }

    /// Make `create_user` fail with `err`.
    pub fn with_create_user_error(self, err: ClientError) -> Self {
        self.lock().create_user_result = Err(err);
        self
    }

    /// Delay `connect` by `delay` before answering.
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.lock().connect_delay = Some(delay);
        self
    }

    /// Delay `create_user` by `delay` before answering.
    pub fn with_create_user_delay(self, delay: Duration) -> Self {
        self.lock().create_user_delay = Some(delay);
        self
    }

    /// All protocol calls so far, in order.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.lock().calls.clone()
    }

    /// True if `create_user` was ever called.
    pub fn create_user_called(&self) -> bool {
        self.lock()
            .calls
            .iter()
            .any(|c| matches!(c, ClientCall::CreateUser { .. }))
    }

    /// Number of `manage_connection` calls.
    pub fn manage_count(&self) -> usize {
        self.inner.manage_calls.load(Ordering::SeqCst)
    }

    /// Number of `manage_connection` calls made after the first `disconnect`.
    pub fn manage_after_disconnect_count(&self) -> usize {
        self.inner.manage_after_disconnect.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls.
    pub fn disconnect_count(&self) -> usize {
        self.inner.disconnect_calls.load(Ordering::SeqCst)
    }

    /// Number of `abort` calls.
    pub fn abort_count(&self) -> usize {
        self.inner.abort_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RpcnClient for MockRpcnClient {
    async fn connect(&self, host: &str) -> Result<(), ClientError> {
        let delay = {
            let mut st = self.lock();
            st.calls.push(ClientCall::Connect {
                host: host.to_string(),
            });
            st.connect_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut st = self.lock();
        if st.state.is_terminal() {
            return Err(ClientError::Terminated);
        }
        let result = st.connect_result.clone();
        if result.is_ok() {
            st.state = ConnectionState::Connected;
        }
        result
    }

    async fn create_user(
        &self,
        npid: &str,
        password: &str,
        online_name: &str,
        avatar_url: &str,
    ) -> Result<(), ClientError> {
        let delay = {
            let mut st = self.lock();
            st.calls.push(ClientCall::CreateUser {
                npid: npid.to_string(),
                password: password.to_string(),
                online_name: online_name.to_string(),
                avatar_url: avatar_url.to_string(),
            });
            st.create_user_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let st = self.lock();
        match st.state {
            ConnectionState::Connected => st.create_user_result.clone(),
            ConnectionState::Idle => Err(ClientError::NotConnected),
            ConnectionState::Disconnected | ConnectionState::Aborted => {
                Err(ClientError::Terminated)
            }
        }
    }

    async fn manage_connection(&self) {
        self.inner.manage_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.disconnect_calls.load(Ordering::SeqCst) > 0 {
            self.inner
                .manage_after_disconnect
                .fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn disconnect(&self) {
        self.inner.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let mut st = self.lock();
        st.calls.push(ClientCall::Disconnect);
        if !st.state.is_terminal() {
            st.state = ConnectionState::Disconnected;
        }
    }

    async fn abort(&self) {
        self.inner.abort_calls.fetch_add(1, Ordering::SeqCst);
        let mut st = self.lock();
        st.calls.push(ClientCall::Abort);
        st.state = ConnectionState::Aborted;
    }

    fn state(&self) -> ConnectionState {
        self.lock().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ServerErrorKind;

    #[tokio::test]
    async fn test_happy_path_states() {
        let client = MockRpcnClient::new();
        assert_eq!(client.state(), ConnectionState::Idle);

        client.connect("host").await.unwrap();
        assert_eq!(client.state(), ConnectionState::Connected);

        client.create_user("npid", "pw", "npid", "url").await.unwrap();
        client.abort().await;
        assert_eq!(client.state(), ConnectionState::Aborted);

        // Terminal sessions never reconnect
        assert_eq!(client.connect("host").await, Err(ClientError::Terminated));
        client.disconnect().await;
        assert_eq!(client.state(), ConnectionState::Aborted);
    }

    #[tokio::test]
    async fn test_create_user_requires_connection() {
        let client = MockRpcnClient::new();
        assert_eq!(
            client.create_user("npid", "pw", "npid", "url").await,
            Err(ClientError::NotConnected)
        );
    }

    #[tokio::test]
    async fn test_scripted_errors() {
        let client = MockRpcnClient::new()
            .with_create_user_error(ClientError::Rejected(ServerErrorKind::UsernameTaken));
        client.connect("host").await.unwrap();
        assert_eq!(
            client.create_user("npid", "pw", "npid", "url").await,
            Err(ClientError::Rejected(ServerErrorKind::UsernameTaken))
        );

        let client = MockRpcnClient::new()
            .with_connect_error(ClientError::ConnectionFailed("refused".to_string()));
        assert!(client.connect("host").await.is_err());
        assert_eq!(client.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_abort_before_connect() {
        let client = MockRpcnClient::new();
        client.abort().await;
        assert_eq!(client.state(), ConnectionState::Aborted);
        assert_eq!(client.calls(), vec![ClientCall::Abort]);
    }

    #[tokio::test]
    async fn test_abort_overrides_disconnected() {
        let client = MockRpcnClient::new();
        client.connect("host").await.unwrap();
        client.disconnect().await;
        assert_eq!(client.state(), ConnectionState::Disconnected);

        client.abort().await;
        assert_eq!(client.state(), ConnectionState::Aborted);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let client = MockRpcnClient::new();
        let observer = client.clone();
        client.manage_connection().await;
        client.disconnect().await;
        client.manage_connection().await;

        assert_eq!(observer.manage_count(), 2);
        assert_eq!(observer.manage_after_disconnect_count(), 1);
        assert_eq!(observer.disconnect_count(), 1);
    }
}
