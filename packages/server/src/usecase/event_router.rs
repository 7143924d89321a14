//! UseCase: リアルタイムイベントのルーティング
//!
//! ## 概要
//!
//! 接続・切断を Presence Registry に反映し、presence の全量スナップショットを
//! 全接続にブロードキャストする。匿名接続は presence を変えないため、
//! スナップショットはその接続にだけ送る。REST ハンドラーが永続化に成功した後に呼ぶ
//! push の入口（`message_created` など）もここに集約する。
//!
//! ## 配送の保証
//!
//! push はベストエフォート（fire-and-forget）。相手がオフライン、送信キューが満杯、
//! 接続が閉じている場合はいずれもイベントを破棄してログに残すだけで、
//! 呼び出し元にエラーは返さない。相手は次の REST 取得で正しい状態を得る。

use std::sync::Arc;

use hanashi_shared::protocol::{
    ClientEvent, MessagesReadPayload, MessagesSeenPayload, ServerEvent,
};

use crate::domain::{Connection, Message, PresenceRegistry, UserId};

/// Result of handling one inbound client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// A well-formed legacy relay event; the router takes no action.
    Ignored(&'static str),
    /// The frame could not be decoded and was dropped.
    Malformed,
}

/// Routes real-time events to live connections.
pub struct EventRouter {
    registry: Arc<dyn PresenceRegistry>,
}

impl EventRouter {
    pub fn new(registry: Arc<dyn PresenceRegistry>) -> Self {
        Self { registry }
    }

    /// A transport opened.
    ///
    /// The connection becomes a broadcast target. An identified connection is
    /// registered for its identity (superseding any previous one) and the new
    /// presence set is broadcast to every connection, the new one included.
    /// An anonymous connection leaves the set unchanged, so only it receives
    /// the current snapshot.
    pub async fn connect(&self, connection: Connection) {
        self.registry.attach(connection.clone()).await;
        match connection.user_id() {
            Some(identity) => {
                self.registry
                    .register(identity.clone(), connection.clone())
                    .await;
                tracing::info!(
                    "User '{}' online with session '{}'",
                    identity,
                    connection.session_id()
                );
            }
            None => {
                tracing::info!("Anonymous session '{}' connected", connection.session_id());
                self.send_snapshot(&connection).await;
                return;
            }
        }
        self.broadcast_presence().await;
    }

    /// A transport closed.
    ///
    /// The identity is released only if it is still registered to this very
    /// session, so an old transport closing late never evicts its replacement.
    pub async fn disconnect(&self, connection: &Connection) {
        let session_id = connection.session_id();
        self.registry.detach(&session_id).await;
        let Some(identity) = connection.user_id() else {
            tracing::info!("Anonymous session '{}' disconnected", session_id);
            return;
        };
        if self.registry.release(identity, &session_id).await {
            tracing::info!("User '{}' offline (session '{}')", identity, session_id);
        }
        self.broadcast_presence().await;
    }

    /// Push the full presence set to every attached connection.
    ///
    /// Returns the number of connections the snapshot was queued for.
    pub async fn broadcast_presence(&self) -> usize {
        let online = self.online_ids().await;
        let online_count = online.len();
        let Some(frame) = encode(&ServerEvent::GetOnlineUsers(online)) else {
            return 0;
        };

        let targets = self.registry.connections().await;
        let mut delivered = 0;
        for connection in &targets {
            // ブロードキャストでは一部の送信失敗を許容
            match connection.push(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("Failed to push presence snapshot: {}", e),
            }
        }
        tracing::debug!(
            "Broadcasted presence ({} online) to {}/{} connections",
            online_count,
            delivered,
            targets.len()
        );
        delivered
    }

    /// Push the current presence set to `connection` alone.
    async fn send_snapshot(&self, connection: &Connection) {
        let Some(frame) = encode(&ServerEvent::GetOnlineUsers(self.online_ids().await)) else {
            return;
        };
        if let Err(e) = connection.push(frame) {
            tracing::warn!(
                "Failed to push presence snapshot to session '{}': {}",
                connection.session_id(),
                e
            );
        }
    }

    async fn online_ids(&self) -> Vec<String> {
        self.registry
            .snapshot()
            .await
            .into_iter()
            .map(UserId::into_string)
            .collect()
    }

    /// Push `event` to the connection registered for `identity`.
    ///
    /// Returns `true` if the event was queued; `false` means it was dropped.
    pub async fn push_to(&self, identity: &UserId, event: &ServerEvent) -> bool {
        let Some(connection) = self.registry.lookup(identity).await else {
            tracing::debug!("User '{}' is offline, dropping '{}'", identity, event.name());
            return false;
        };
        let Some(frame) = encode(event) else {
            return false;
        };
        match connection.push(frame) {
            Ok(()) => {
                tracing::debug!("Pushed '{}' to user '{}'", event.name(), identity);
                true
            }
            Err(e) => {
                tracing::warn!("Dropped '{}' for user '{}': {}", event.name(), identity, e);
                false
            }
        }
    }

    /// A message was stored; notify its receiver.
    pub async fn message_created(&self, message: &Message) -> bool {
        self.push_to(&message.receiver_id, &ServerEvent::NewMessage(message.into()))
            .await
    }

    /// `reader` has seen the messages `sender` sent them; notify `sender`.
    pub async fn messages_seen(&self, sender: &UserId, reader: &UserId) -> bool {
        let event = ServerEvent::MessagesSeen(MessagesSeenPayload {
            sender_id: sender.as_str().to_string(),
            receiver_id: reader.as_str().to_string(),
        });
        self.push_to(sender, &event).await
    }

    /// `reader` marked `sender`'s messages as read; notify the reader's own session.
    pub async fn messages_read(&self, sender: &UserId, reader: &UserId) -> bool {
        let event = ServerEvent::MessagesRead(MessagesReadPayload {
            sender_id: sender.as_str().to_string(),
        });
        self.push_to(reader, &event).await
    }

    /// A message was edited by its sender; notify its receiver.
    pub async fn message_edited(&self, message: &Message) -> bool {
        self.push_to(
            &message.receiver_id,
            &ServerEvent::MessageEdited(message.into()),
        )
        .await
    }

    /// Handle a text frame sent by a client.
    ///
    /// Client-originated events are legacy relays: creation, edits and seen
    /// status all go through REST, which pushes the resulting events itself.
    /// Malformed frames are dropped without affecting other connections.
    pub fn handle_inbound(&self, connection: &Connection, frame: &str) -> InboundOutcome {
        match ClientEvent::from_json(frame) {
            Ok(event) => {
                tracing::debug!(
                    "Ignoring legacy '{}' event from session '{}'",
                    event.name(),
                    connection.session_id()
                );
                InboundOutcome::Ignored(event.name())
            }
            Err(e) => {
                tracing::warn!(
                    "Dropping malformed frame from session '{}': {}",
                    connection.session_id(),
                    e
                );
                InboundOutcome::Malformed
            }
        }
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match event.to_json() {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::error!("Failed to serialize '{}': {}", event.name(), e);
            None
        }
    }
}
