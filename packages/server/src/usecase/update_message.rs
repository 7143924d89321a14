//! UseCase: メッセージ更新処理（既読化・編集）
//!
//! `PUT /messages/{id}` の 2 つのアクションを扱う。
//!
//! - `markSeen`: `id` は会話相手のユーザー ID。相手から自分宛ての未読を既読にし、
//!   相手に `messagesSeen`、自分の接続に `messagesRead` を push する
//! - `edit`: `id` はメッセージ ID。送信者本人のみ本文を書き換えられ、
//!   受信者に `messageEdited` を push する

use std::sync::Arc;

use hanashi_shared::protocol::{UpdateMessageRequest, action};

use crate::domain::{Message, MessageId, MessageRepository, MessageText, UserId};

use super::{error::UpdateMessageError, event_router::EventRouter};

/// Result of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Number of messages that flipped to seen.
    MarkedSeen(usize),
    /// The message after the edit.
    Edited(Message),
}

/// メッセージ更新のユースケース
pub struct UpdateMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    router: Arc<EventRouter>,
}

impl UpdateMessageUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>, router: Arc<EventRouter>) -> Self {
        Self { messages, router }
    }

    /// Dispatch on `request.action`.
    pub async fn execute(
        &self,
        caller: &UserId,
        id: String,
        request: UpdateMessageRequest,
    ) -> Result<UpdateOutcome, UpdateMessageError> {
        let Some(kind) = request.action.filter(|a| !a.is_empty()) else {
            return Err(UpdateMessageError::ActionRequired);
        };
        match kind.as_str() {
            action::MARK_SEEN => {
                let peer = UserId::new(id).map_err(UpdateMessageError::InvalidId)?;
                self.mark_seen(caller, &peer)
                    .await
                    .map(UpdateOutcome::MarkedSeen)
            }
            action::EDIT => {
                let id = MessageId::new(id).map_err(UpdateMessageError::InvalidId)?;
                let text = match request.text {
                    Some(text) if !text.trim().is_empty() => {
                        MessageText::new(text).map_err(UpdateMessageError::InvalidContent)?
                    }
                    _ => return Err(UpdateMessageError::TextRequired),
                };
                self.edit(caller, &id, text).await.map(UpdateOutcome::Edited)
            }
            other => Err(UpdateMessageError::InvalidAction(other.to_string())),
        }
    }

    /// Mark every unseen message from `peer` to `caller` as seen.
    ///
    /// Both notifications are pushed even when nothing changed, so a second
    /// session of the caller still converges.
    pub async fn mark_seen(
        &self,
        caller: &UserId,
        peer: &UserId,
    ) -> Result<usize, UpdateMessageError> {
        let updated = self.messages.mark_seen(peer, caller).await?;
        tracing::debug!(
            "User '{}' marked {} message(s) from '{}' as seen",
            caller,
            updated,
            peer
        );

        self.router.messages_seen(peer, caller).await;
        self.router.messages_read(peer, caller).await;

        Ok(updated)
    }

    /// Replace the text of message `id`; only its sender may do so.
    pub async fn edit(
        &self,
        caller: &UserId,
        id: &MessageId,
        text: MessageText,
    ) -> Result<Message, UpdateMessageError> {
        let mut message = self
            .messages
            .find_by_id(id)
            .await?
            .ok_or_else(|| UpdateMessageError::MessageNotFound(id.as_str().to_string()))?;

        message.edit(caller, text)?;
        self.messages.update(message.clone()).await?;

        self.router.message_edited(&message).await;

        Ok(message)
    }
}
