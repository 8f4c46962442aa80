//! WebSocket implementation of [`RpcnClient`].
//!
//! Requests and replies are JSON text frames. One `tokio::sync::Mutex`
//! guards the stream so the account flow and the background pump never
//! touch the socket at the same time.

use async_trait::async_trait;
use futures_util::{FutureExt, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex as StdMutex, MutexGuard as StdMutexGuard};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::traits::{ClientError, ConnectionState, RpcnClient, ServerErrorKind};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default endpoint path appended to a bare host.
pub const DEFAULT_ENDPOINT_PATH: &str = "/rpcn";

/// Outgoing request frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    CreateUser {
        npid: String,
        password: String,
        online_name: String,
        avatar_url: String,
    },
}

/// Incoming frames we care about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    CreateUserReply {
        ok: bool,
        #[serde(default)]
        error: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Configuration for [`WsRpcnClient`].
#[derive(Debug, Clone)]
pub struct WsRpcnClientConfig {
    /// Path appended when `connect` receives a host without a scheme.
    pub endpoint_path: String,
}

impl Default for WsRpcnClientConfig {
    fn default() -> Self {
        Self {
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
        }
    }
}

/// RPCN client speaking JSON over a WebSocket.
pub struct WsRpcnClient {
    config: WsRpcnClientConfig,
    stream: Mutex<Option<WsStream>>,
    state: StdMutex<ConnectionState>,
}

impl Default for WsRpcnClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WsRpcnClient {
    /// Create an unconnected client with the default configuration.
    pub fn new() -> Self {
        Self::with_config(WsRpcnClientConfig::default())
    }

    /// Create an unconnected client.
    pub fn with_config(config: WsRpcnClientConfig) -> Self {
        Self {
            config,
            stream: Mutex::new(None),
            state: StdMutex::new(ConnectionState::Idle),
        }
    }

    /// Build the WebSocket URL for `host`.
    pub fn endpoint_url(&self, host: &str) -> String {
        if host.contains("://") {
            host.to_string()
        } else {
            format!("ws://{}{}", host, self.config.endpoint_path)
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let mut state = self.state_guard();
        // Terminal states are sticky, except for a forced abort
        if !state.is_terminal() {
            *state = next;
        }
    }

    fn state_guard(&self) -> StdMutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Wait for the reply to a `create_user` request.
    ///
    /// Pings are answered and unrelated frames are skipped while waiting.
    async fn await_create_user_reply(&self, ws: &mut WsStream) -> Result<(), ClientError> {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMessage>(&text)
                {
                    Ok(ServerMessage::CreateUserReply { ok: true, .. }) => return Ok(()),
                    Ok(ServerMessage::CreateUserReply { ok: false, error }) => {
                        let token = error.unwrap_or_else(|| "Unknown".to_string());
                        return Err(ClientError::Rejected(ServerErrorKind::from_token(&token)));
                    }
                    Ok(ServerMessage::Unknown) => {
                        debug!("Skipping unrelated frame while waiting for reply");
                    }
                    Err(e) => {
                        return Err(ClientError::Protocol(format!("bad reply: {}", e)));
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.set_state(ConnectionState::Disconnected);
                    return Err(ClientError::Protocol(
                        "connection closed before reply".to_string(),
                    ));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.set_state(ConnectionState::Aborted);
                    return Err(ClientError::Protocol(e.to_string()));
                }
            }
        }
    }
}

#[async_trait]
impl RpcnClient for WsRpcnClient {
    async fn connect(&self, host: &str) -> Result<(), ClientError> {
        let mut guard = self.stream.lock().await;
        match self.state() {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::Disconnected | ConnectionState::Aborted => {
                return Err(ClientError::Terminated)
            }
            ConnectionState::Idle => {}
        }

        let url = self.endpoint_url(host);
        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;

        info!("Connected to RPCN server at {}", url);
        *guard = Some(ws);
        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    async fn create_user(
        &self,
        npid: &str,
        password: &str,
        online_name: &str,
        avatar_url: &str,
    ) -> Result<(), ClientError> {
        let mut guard = self.stream.lock().await;
        match self.state() {
            ConnectionState::Connected => {}
            ConnectionState::Idle => return Err(ClientError::NotConnected),
            _ => return Err(ClientError::Terminated),
        }
        let ws = guard.as_mut().ok_or(ClientError::NotConnected)?;

        let request = ClientRequest::CreateUser {
            npid: npid.to_string(),
            password: password.to_string(),
            online_name: online_name.to_string(),
            avatar_url: avatar_url.to_string(),
        };
        let json =
            serde_json::to_string(&request).map_err(|e| ClientError::Protocol(e.to_string()))?;

        debug!("Sending create_user for {}", npid);
        ws.send(Message::Text(json))
            .await
            .map_err(|e| ClientError::SendFailed(e.to_string()))?;

        let result = self.await_create_user_reply(ws).await;
        if self.state().is_terminal() {
            // The server is gone; do not keep a dead stream around
            *guard = None;
        }
        result
    }

    async fn manage_connection(&self) {
        // A protocol call in flight owns the socket; skip this round
        let Ok(mut guard) = self.stream.try_lock() else {
            return;
        };
        let Some(ws) = guard.as_mut() else {
            return;
        };

        let Some(frame) = ws.next().now_or_never() else {
            return;
        };

        match frame {
            Some(Ok(Message::Ping(data))) => {
                let _ = ws.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("RPCN server closed the connection");
                *guard = None;
                self.set_state(ConnectionState::Disconnected);
            }
            Some(Ok(other)) => {
                debug!("Ignoring unsolicited frame: {:?}", other);
            }
            Some(Err(e)) => {
                warn!("RPCN connection error: {}", e);
                *guard = None;
                self.set_state(ConnectionState::Aborted);
            }
        }
    }

    async fn disconnect(&self) {
        let mut guard = self.stream.lock().await;
        if let Some(mut ws) = guard.take() {
            if !self.state().is_terminal() {
                if let Err(e) = ws.close(None).await {
                    debug!("Close handshake failed: {}", e);
                }
            }
        }
        self.set_state(ConnectionState::Disconnected);
    }

    async fn abort(&self) {
        let mut guard = self.stream.lock().await;
        // Dropping the stream closes the socket without a close frame
        guard.take();
        *self.state_guard() = ConnectionState::Aborted;
    }

    fn state(&self) -> ConnectionState {
        *self.state_guard()
    }
}
