//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Message, MessageId, MessageRepository, RepositoryError, UserId};

/// インメモリ Message Repository 実装
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<HashMap<MessageId, Message>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().await;
        if messages.contains_key(&message.id) {
            return Err(RepositoryError::DuplicateMessage(
                message.id.as_str().to_string(),
            ));
        }
        messages.insert(message.id.clone(), message);
        Ok(())
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages.get(id).cloned())
    }

    async fn update(&self, message: Message) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().await;
        match messages.get_mut(&message.id) {
            Some(stored) => {
                *stored = message;
                Ok(())
            }
            None => Err(RepositoryError::MessageNotFound(
                message.id.as_str().to_string(),
            )),
        }
    }

    async fn find_conversation(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut conversation: Vec<Message> = messages
            .values()
            .filter(|m| m.is_between(a, b))
            .cloned()
            .collect();
        conversation.sort_by(|x, y| x.order_key().cmp(&y.order_key()));
        Ok(conversation)
    }

    async fn mark_seen(
        &self,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<usize, RepositoryError> {
        let mut messages = self.messages.lock().await;
        let updated = messages
            .values_mut()
            .filter(|m| &m.sender_id == sender && &m.receiver_id == receiver)
            .map(Message::mark_seen)
            .filter(|changed| *changed)
            .count();
        Ok(updated)
    }

    async fn unread_counts(
        &self,
        receiver: &UserId,
    ) -> Result<HashMap<UserId, usize>, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut counts: HashMap<UserId, usize> = HashMap::new();
        for message in messages
            .values()
            .filter(|m| &m.receiver_id == receiver && !m.seen)
        {
            *counts.entry(message.sender_id.clone()).or_default() += 1;
        }
        Ok(counts)
    }

    async fn last_message_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Message>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages
            .values()
            .filter(|m| m.is_between(a, b))
            .max_by(|x, y| x.order_key().cmp(&y.order_key()))
            .cloned())
    }
}
