//! Presence registry trait 定義
//!
//! ユーザー ID からアクティブな接続への対応表をドメイン層のインターフェースとして定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{
    error::PushError,
    value_object::{SessionId, UserId},
};

/// Outbound channel of one connection; its writer task drains it into the socket.
pub type Outbox = mpsc::Sender<String>;

/// Handle to a live transport session.
///
/// Cloning the handle is cheap; all clones push into the same outbox.
#[derive(Debug, Clone)]
pub struct Connection {
    session_id: SessionId,
    user_id: Option<UserId>,
    outbox: Outbox,
}

impl Connection {
    /// Wrap a new transport. `user_id` is `None` for anonymous transports.
    pub fn new(user_id: Option<UserId>, outbox: Outbox) -> Self {
        Self {
            session_id: SessionId::generate(),
            user_id,
            outbox,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Whether the writer side of this connection is still alive.
    pub fn is_open(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Queue a text frame without waiting.
    ///
    /// A full outbox drops the frame so that one slow peer never stalls the
    /// caller.
    pub fn push(&self, frame: String) -> Result<(), PushError> {
        self.outbox.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => PushError::OutboxFull(self.session_id.to_string()),
            TrySendError::Closed(_) => PushError::Closed(self.session_id.to_string()),
        })
    }
}

/// Process-wide mapping from user identity to its active connection.
///
/// At most one connection is registered per identity; registering again
/// silently supersedes the previous entry (the superseded transport is not
/// closed, it just stops being reachable through [`PresenceRegistry::lookup`]).
///
/// Separately, the registry tracks every attached transport, identified or
/// anonymous, as the target set of presence broadcasts.
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// Track a live transport as a broadcast target.
    async fn attach(&self, connection: Connection);

    /// Stop tracking a transport. No-op if unknown.
    async fn detach(&self, session_id: &SessionId);

    /// Insert or overwrite the mapping for `identity`.
    async fn register(&self, identity: UserId, connection: Connection);

    /// Remove the mapping for `identity` if present.
    async fn unregister(&self, identity: &UserId);

    /// Remove the mapping for `identity` only if it still points at
    /// `session_id`. Returns `true` if something was removed.
    async fn release(&self, identity: &UserId, session_id: &SessionId) -> bool;

    /// Connection registered for `identity`; `None` means offline.
    async fn lookup(&self, identity: &UserId) -> Option<Connection>;

    /// The presence set: registered identities in ascending order.
    async fn snapshot(&self) -> Vec<UserId>;

    /// Every attached transport.
    async fn connections(&self) -> Vec<Connection>;
}
