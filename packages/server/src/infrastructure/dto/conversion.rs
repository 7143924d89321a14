//! Conversion logic between domain entities and wire DTOs.

use hanashi_shared::protocol::MessageDto;

use crate::domain::entity;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<entity::Message> for MessageDto {
    fn from(model: entity::Message) -> Self {
        Self {
            id: model.id.into_string(),
            sender_id: model.sender_id.into_string(),
            receiver_id: model.receiver_id.into_string(),
            text: model.text.map(|t| t.into_string()),
            image_url: model.image_url,
            seen: model.seen,
            created_at: model.created_at.value(),
        }
    }
}

impl From<&entity::Message> for MessageDto {
    fn from(model: &entity::Message) -> Self {
        model.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, MessageText, Timestamp, UserId};

    #[test]
    fn test_domain_message_to_dto() {
        // テスト項目: ドメインエンティティの Message が DTO に変換される
        // given (前提条件):
        let mut domain_msg = entity::Message::new(
            MessageId::new("m1".to_string()).unwrap(),
            UserId::new("alice".to_string()).unwrap(),
            UserId::new("bob".to_string()).unwrap(),
            Some(MessageText::new("Hi!".to_string()).unwrap()),
            Some("https://img.example/a.png".to_string()),
            Timestamp::new(2000),
        )
        .unwrap();
        domain_msg.mark_seen();

        // when (操作):
        let dto: MessageDto = domain_msg.into();

        // then (期待する結果):
        assert_eq!(dto.id, "m1");
        assert_eq!(dto.sender_id, "alice");
        assert_eq!(dto.receiver_id, "bob");
        assert_eq!(dto.text.as_deref(), Some("Hi!"));
        assert_eq!(dto.image_url.as_deref(), Some("https://img.example/a.png"));
        assert!(dto.seen);
        assert_eq!(dto.created_at, 2000);
    }
}
