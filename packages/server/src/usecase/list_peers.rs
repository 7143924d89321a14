//! UseCase: 会話相手一覧と未読数の取得

use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use crate::domain::{Message, MessageRepository, UserId, UserRepository};

use super::error::QueryError;

/// One entry of the caller's conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: UserId,
    pub last_message: Option<Message>,
}

/// 会話相手一覧のユースケース
pub struct ListPeersUseCase {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
}

impl ListPeersUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { messages, users }
    }

    /// Every known user except `caller`.
    ///
    /// Peers with a conversation come first, most recent message first;
    /// the rest follow in id order.
    pub async fn execute(&self, caller: &UserId) -> Result<Vec<Peer>, QueryError> {
        let mut peers = Vec::new();
        for id in self.users.list_except(caller).await {
            let last_message = self.messages.last_message_between(caller, &id).await?;
            peers.push(Peer { id, last_message });
        }
        // list_except は ID 順なので安定ソートで同順位は ID 順のまま
        peers.sort_by_key(|peer| {
            Reverse(
                peer.last_message
                    .as_ref()
                    .map(|m| (m.created_at, m.id.clone())),
            )
        });
        Ok(peers)
    }
}

/// 未読数取得のユースケース
pub struct UnreadCountsUseCase {
    messages: Arc<dyn MessageRepository>,
}

impl UnreadCountsUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Unseen messages addressed to `caller`, per sender. Senders with no
    /// unseen messages are absent.
    pub async fn execute(&self, caller: &UserId) -> Result<HashMap<UserId, usize>, QueryError> {
        Ok(self.messages.unread_counts(caller).await?)
    }
}
