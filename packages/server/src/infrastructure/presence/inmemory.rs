//! インメモリの PresenceRegistry 実装
//!
//! ## 責務
//!
//! - 接続中の全トランスポート（匿名を含む）の管理
//! - ユーザー ID → 接続 の対応表の管理（1 ユーザーにつき 1 接続、後勝ち）
//!
//! ## 設計ノート
//!
//! ロックを保持したまま I/O を行わない。`lookup` は接続ハンドルの複製を返し、
//! 呼び出し側はロック解放後に送信する。

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Connection, PresenceRegistry, SessionId, UserId};

#[derive(Default)]
struct Registry {
    /// Every attached transport, keyed by session.
    connections: HashMap<SessionId, Connection>,
    /// Identity → registered connection. Ordered so snapshots are stable.
    identities: BTreeMap<UserId, Connection>,
}

/// インメモリ PresenceRegistry 実装
#[derive(Default)]
pub struct InMemoryPresenceRegistry {
    inner: Mutex<Registry>,
}

impl InMemoryPresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRegistry for InMemoryPresenceRegistry {
    async fn attach(&self, connection: Connection) {
        let mut registry = self.inner.lock().await;
        tracing::debug!("Session '{}' attached", connection.session_id());
        registry
            .connections
            .insert(connection.session_id(), connection);
    }

    async fn detach(&self, session_id: &SessionId) {
        let mut registry = self.inner.lock().await;
        if registry.connections.remove(session_id).is_some() {
            tracing::debug!("Session '{}' detached", session_id);
        }
    }

    async fn register(&self, identity: UserId, connection: Connection) {
        let mut registry = self.inner.lock().await;
        let session_id = connection.session_id();
        if let Some(previous) = registry.identities.insert(identity.clone(), connection) {
            tracing::info!(
                "User '{}' superseded session '{}' with '{}'",
                identity,
                previous.session_id(),
                session_id
            );
        } else {
            tracing::debug!("User '{}' registered with session '{}'", identity, session_id);
        }
    }

    async fn unregister(&self, identity: &UserId) {
        let mut registry = self.inner.lock().await;
        if registry.identities.remove(identity).is_some() {
            tracing::debug!("User '{}' unregistered", identity);
        }
    }

    async fn release(&self, identity: &UserId, session_id: &SessionId) -> bool {
        let mut registry = self.inner.lock().await;
        let owned = registry
            .identities
            .get(identity)
            .is_some_and(|conn| &conn.session_id() == session_id);
        if owned {
            registry.identities.remove(identity);
            tracing::debug!("User '{}' released by session '{}'", identity, session_id);
        } else {
            tracing::debug!(
                "Session '{}' no longer owns user '{}', keeping registration",
                session_id,
                identity
            );
        }
        owned
    }

    async fn lookup(&self, identity: &UserId) -> Option<Connection> {
        let registry = self.inner.lock().await;
        registry.identities.get(identity).cloned()
    }

    async fn snapshot(&self) -> Vec<UserId> {
        let registry = self.inner.lock().await;
        registry.identities.keys().cloned().collect()
    }

    async fn connections(&self) -> Vec<Connection> {
        let registry = self.inner.lock().await;
        registry.connections.values().cloned().collect()
    }
}
