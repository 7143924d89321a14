//! WebSocket connection manager with reconnection support.

use futures_util::{SinkExt, StreamExt};
use hanashi_shared::protocol::ServerEvent;
use reqwest::Url;
use tokio::{sync::watch, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::{
    error::ClientError,
    store::{StoreEvent, StoreHandle},
};

use super::{policy::ReconnectPolicy, state::ConnectionState};

/// Owns the transport of one logged-in user.
///
/// Pushed events are forwarded to the store. Transport failures are retried
/// following the [`ReconnectPolicy`] until [`logout`](Self::logout) is called
/// or the attempts run out. Dropping the manager has the same effect as a logout.
pub struct ConnectionManager {
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<Result<(), ClientError>>>,
}

impl ConnectionManager {
    /// Start connecting to `url` (e.g. `ws://127.0.0.1:8080/ws`) as `user_id`.
    pub fn spawn(
        url: &Url,
        user_id: &str,
        policy: ReconnectPolicy,
        store: StoreHandle,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let lifecycle = Lifecycle {
            url: session_url(url, user_id),
            policy,
            store,
            state: state_tx,
            shutdown: shutdown_rx,
        };
        let task = tokio::spawn(lifecycle.run());

        Self {
            state: state_rx,
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Close the transport and stop reconnecting.
    pub fn logout(&self) {
        self.shutdown.send_replace(true);
    }

    /// Wait for the lifecycle to end.
    ///
    /// Returns an error if the reconnection attempts were exhausted. Once it
    /// has returned, later calls return `Ok(())` immediately.
    pub async fn join(&mut self) -> Result<(), ClientError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let result = task.await;
        self.task = None;
        result.map_err(|e| ClientError::ConnectionError(format!("Connection task failed: {}", e)))?
    }
}

enum SessionEnd {
    Shutdown,
    Lost(String),
}

struct Lifecycle {
    url: String,
    policy: ReconnectPolicy,
    store: StoreHandle,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Receiver<bool>,
}

impl Lifecycle {
    async fn run(mut self) -> Result<(), ClientError> {
        let mut failures: u32 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.publish(ConnectionState::Connecting {
                attempt: failures + 1,
            });
            tracing::info!(
                "Attempting to connect to {} (attempt {}/{})",
                self.url,
                failures + 1,
                self.policy.max_attempts
            );

            let connected = tokio::select! {
                result = connect_async(&self.url) => result,
                _ = shutdown_requested(&mut self.shutdown) => break,
            };

            match connected {
                Ok((stream, _response)) => {
                    tracing::info!("Connected to chat server!");
                    failures = 0;
                    self.publish(ConnectionState::Connected);
                    match self.run_session(stream).await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Lost(reason) => {
                            tracing::warn!("Connection lost: {}", reason);
                            self.store.dispatch(StoreEvent::ConnectionError(reason));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Connection failed: {}", e);
                    self.store.dispatch(StoreEvent::ConnectionError(e.to_string()));
                }
            }

            failures += 1;
            if !self.policy.should_attempt_reconnect(failures) {
                tracing::error!("Failed to reconnect after {} attempts. Giving up.", failures);
                self.publish(ConnectionState::Disconnected);
                return Err(ClientError::ConnectionError(format!(
                    "Failed to reconnect after {} attempts",
                    failures
                )));
            }

            let delay = self.policy.delay_for(failures);
            self.publish(ConnectionState::Connecting {
                attempt: failures + 1,
            });
            tracing::info!("Reconnecting in {:?}...", delay);
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_requested(&mut self.shutdown) => break,
            }
        }

        tracing::info!("Logged out");
        self.publish(ConnectionState::Disconnected);
        self.store.dispatch(StoreEvent::LoggedOut);
        Ok(())
    }

    async fn run_session(
        &mut self,
        stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    ) -> SessionEnd {
        let (mut write, mut read) = stream.split();

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => match ServerEvent::from_json(&text) {
                        Ok(event) => {
                            tracing::debug!("Received '{}'", event.name());
                            self.store.dispatch(event.into());
                        }
                        Err(e) => tracing::warn!("Ignoring malformed frame: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        return SessionEnd::Lost("Server closed the connection".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
                },
                _ = shutdown_requested(&mut self.shutdown) => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        tracing::debug!("Failed to send close frame: {}", e);
                    }
                    return SessionEnd::Shutdown;
                }
            }
        }
    }

    fn publish(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!("Connection state: {} -> {}", previous, state);
            self.store.dispatch(StoreEvent::ConnectionChanged(state));
        }
    }
}

/// `url` with the user id appended as the form-encoded `userId` query pair.
fn session_url(url: &Url, user_id: &str) -> String {
    let mut url = url.clone();
    url.query_pairs_mut().append_pair("userId", user_id);
    url.into()
}

/// Resolves once logout is requested or the manager is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
