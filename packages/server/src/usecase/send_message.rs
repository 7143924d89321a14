//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 入力検証（受信者・本文）、永続化、受信者への newMessage の push
//!
//! ### どのような状況を想定しているか
//! - 正常系：受信者がオンライン / オフライン
//! - 異常系：受信者なし、不正な受信者 ID、本文も画像もない
//! - エッジケース：空白のみの本文と画像 URL の組み合わせ

use std::sync::Arc;

use hanashi_shared::{
    protocol::CreateMessageRequest,
    time::{Clock, timestamp_to_rfc3339},
};

use crate::domain::{
    Message, MessageIdFactory, MessageRepository, MessageText, Timestamp, UserId, UserRepository,
};

use super::{error::SendMessageError, event_router::EventRouter};

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    users: Arc<dyn UserRepository>,
    router: Arc<EventRouter>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        router: Arc<EventRouter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            users,
            router,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// 永続化に成功した後で受信者へ `newMessage` を push する。
    /// push の失敗（オフライン等）は送信の成否に影響しない。
    pub async fn execute(
        &self,
        sender: &UserId,
        request: CreateMessageRequest,
    ) -> Result<Message, SendMessageError> {
        // 1. 入力検証
        let receiver = match request.receiver_id {
            Some(raw) if !raw.trim().is_empty() => {
                UserId::new(raw).map_err(SendMessageError::InvalidReceiverId)?
            }
            _ => return Err(SendMessageError::ReceiverRequired),
        };
        let text = request
            .text
            .filter(|t| !t.trim().is_empty())
            .map(MessageText::new)
            .transpose()
            .map_err(SendMessageError::InvalidContent)?;

        let message = Message::new(
            MessageIdFactory::generate(),
            sender.clone(),
            receiver.clone(),
            text,
            request.image_url,
            Timestamp::new(self.clock.now_millis()),
        )
        .map_err(|_| SendMessageError::ContentRequired)?;

        // 2. 永続化
        self.users.upsert(sender.clone()).await;
        self.users.upsert(receiver).await;
        self.messages.insert(message.clone()).await?;
        tracing::debug!(
            "Message '{}' from '{}' to '{}' stored at {}",
            message.id.as_str(),
            message.sender_id.as_str(),
            message.receiver_id.as_str(),
            timestamp_to_rfc3339(message.created_at.value())
        );

        // 3. 受信者への push（ベストエフォート）
        self.router.message_created(&message).await;

        Ok(message)
    }
}
