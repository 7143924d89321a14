//! UseCase: 会話履歴の取得
//!
//! 履歴を返すと同時に、相手から自分宛ての未読を既読にする（暗黙の既読化）。
//! 何か返した場合は相手に `messagesSeen` を push する。

use std::sync::Arc;

use crate::domain::{Message, MessageRepository, UserId};

use super::{error::QueryError, event_router::EventRouter};

/// 会話履歴取得のユースケース
pub struct GetConversationUseCase {
    messages: Arc<dyn MessageRepository>,
    router: Arc<EventRouter>,
}

impl GetConversationUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>, router: Arc<EventRouter>) -> Self {
        Self { messages, router }
    }

    /// Conversation between `caller` and `peer`, `createdAt` ascending.
    pub async fn execute(&self, caller: &UserId, peer: String) -> Result<Vec<Message>, QueryError> {
        let peer = UserId::new(peer).map_err(QueryError::InvalidId)?;

        let mut conversation = self.messages.find_conversation(caller, &peer).await?;
        if conversation.is_empty() {
            return Ok(conversation);
        }

        let updated = self.messages.mark_seen(&peer, caller).await?;
        for message in conversation
            .iter_mut()
            .filter(|m| m.sender_id == peer && &m.receiver_id == caller)
        {
            message.mark_seen();
        }
        tracing::debug!(
            "Loaded {} message(s) between '{}' and '{}' ({} newly seen)",
            conversation.len(),
            caller,
            peer,
            updated
        );

        self.router.messages_seen(&peer, caller).await;

        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, MessageId, MessageText, Timestamp},
        infrastructure::{
            presence::InMemoryPresenceRegistry, repository::InMemoryMessageRepository,
        },
    };
    use hanashi_shared::protocol::{MessagesSeenPayload, ServerEvent};
    use tokio::sync::mpsc;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn message(id: &str, from: &str, to: &str, created_at: i64) -> Message {
        Message::new(
            MessageId::new(id.to_string()).unwrap(),
            user(from),
            user(to),
            Some(MessageText::new(format!("text {}", id)).unwrap()),
            None,
            Timestamp::new(created_at),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_conversation_marks_peer_messages_seen() {
        // テスト項目: 履歴取得で相手からのメッセージのみ既読になり、相手に messagesSeen が届く
        // given (前提条件):
        let repo = Arc::new(InMemoryMessageRepository::new());
        repo.insert(message("m1", "bob", "alice", 1000)).await.unwrap();
        repo.insert(message("m2", "alice", "bob", 2000)).await.unwrap();
        let router = Arc::new(EventRouter::new(Arc::new(InMemoryPresenceRegistry::new())));
        let (tx, mut bob_rx) = mpsc::channel(16);
        router.connect(Connection::new(Some(user("bob")), tx)).await;
        let _presence = bob_rx.recv().await;
        let usecase = GetConversationUseCase::new(repo.clone(), router);

        // when (操作):
        let conversation = usecase.execute(&user("alice"), "bob".to_string()).await.unwrap();

        // then (期待する結果):
        let seen: Vec<(&str, bool)> = conversation
            .iter()
            .map(|m| (m.id.as_str(), m.seen))
            .collect();
        assert_eq!(seen, vec![("m1", true), ("m2", false)]);
        assert!(repo.unread_counts(&user("alice")).await.unwrap().is_empty());
        assert_eq!(
            ServerEvent::from_json(&bob_rx.recv().await.unwrap()).unwrap(),
            ServerEvent::MessagesSeen(MessagesSeenPayload {
                sender_id: "bob".to_string(),
                receiver_id: "alice".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_empty_conversation_pushes_nothing() {
        // テスト項目: 会話が空なら何も push しない
        // given (前提条件):
        let repo = Arc::new(InMemoryMessageRepository::new());
        let router = Arc::new(EventRouter::new(Arc::new(InMemoryPresenceRegistry::new())));
        let (tx, mut bob_rx) = mpsc::channel(16);
        router.connect(Connection::new(Some(user("bob")), tx)).await;
        let _presence = bob_rx.recv().await;
        let usecase = GetConversationUseCase::new(repo, router);

        // when (操作):
        let conversation = usecase.execute(&user("alice"), "bob".to_string()).await.unwrap();

        // then (期待する結果):
        assert!(conversation.is_empty());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_invalid_peer_id_is_rejected() {
        // テスト項目: 不正な相手 ID はエラーになる
        // given (前提条件):
        let usecase = GetConversationUseCase::new(
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(EventRouter::new(Arc::new(InMemoryPresenceRegistry::new()))),
        );

        // when (操作):
        let result = usecase.execute(&user("alice"), "two words".to_string()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(QueryError::InvalidId(_))));
    }
}
