//! Entities of the messaging domain.

use super::{
    error::DomainError,
    value_object::{MessageId, MessageText, Timestamp, UserId},
};

/// A direct message between two users.
///
/// Immutable except for `text` (sender only, see [`Message::edit`]) and
/// `seen` (false → true only, see [`Message::mark_seen`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: Option<MessageText>,
    pub image_url: Option<String>,
    pub seen: bool,
    pub created_at: Timestamp,
}

impl Message {
    /// Create a new unseen message.
    ///
    /// # Errors
    ///
    /// [`DomainError::EmptyContent`] if both `text` and `image_url` are absent.
    pub fn new(
        id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        text: Option<MessageText>,
        image_url: Option<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let image_url = image_url.filter(|url| !url.trim().is_empty());
        if text.is_none() && image_url.is_none() {
            return Err(DomainError::EmptyContent);
        }
        Ok(Self {
            id,
            sender_id,
            receiver_id,
            text,
            image_url,
            seen: false,
            created_at,
        })
    }

    /// Replace the text; only the sender may edit.
    pub fn edit(&mut self, editor: &UserId, text: MessageText) -> Result<(), DomainError> {
        if editor != &self.sender_id {
            return Err(DomainError::NotAuthorized(editor.as_str().to_string()));
        }
        self.text = Some(text);
        Ok(())
    }

    /// Mark as seen. Returns `true` if the flag changed.
    pub fn mark_seen(&mut self) -> bool {
        let changed = !self.seen;
        self.seen = true;
        changed
    }

    /// Whether this message belongs to the conversation between `a` and `b`.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.sender_id == a && &self.receiver_id == b)
            || (&self.sender_id == b && &self.receiver_id == a)
    }

    /// The other party of the conversation as seen from `me`.
    pub fn peer_of(&self, me: &UserId) -> &UserId {
        if &self.sender_id == me {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }

    /// Conversation order key: `createdAt`, then id.
    pub fn order_key(&self) -> (Timestamp, &MessageId) {
        (self.created_at, &self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn text(value: &str) -> MessageText {
        MessageText::new(value.to_string()).unwrap()
    }

    fn message() -> Message {
        Message::new(
            MessageId::new("m1".to_string()).unwrap(),
            user("alice"),
            user("bob"),
            Some(text("hello")),
            None,
            Timestamp::new(1000),
        )
        .unwrap()
    }

    #[test]
    fn test_new_message_requires_content() {
        // テスト項目: テキストも画像もないメッセージは作成できない
        // given (前提条件):
        let id = MessageId::new("m1".to_string()).unwrap();

        // when (操作):
        let result = Message::new(
            id,
            user("alice"),
            user("bob"),
            None,
            Some("   ".to_string()),
            Timestamp::new(1000),
        );

        // then (期待する結果):
        assert_eq!(result, Err(DomainError::EmptyContent));
    }

    #[test]
    fn test_image_only_message_is_valid() {
        // テスト項目: 画像のみのメッセージは作成できる
        // given (前提条件):
        let id = MessageId::new("m1".to_string()).unwrap();

        // when (操作):
        let result = Message::new(
            id,
            user("alice"),
            user("bob"),
            None,
            Some("https://img.example/cat.png".to_string()),
            Timestamp::new(1000),
        );

        // then (期待する結果):
        let msg = result.unwrap();
        assert!(!msg.seen);
        assert_eq!(msg.image_url.as_deref(), Some("https://img.example/cat.png"));
    }

    #[test]
    fn test_only_sender_can_edit() {
        // テスト項目: 送信者以外の編集は拒否され、本文は変わらない
        // given (前提条件):
        let mut msg = message();

        // when (操作):
        let rejected = msg.edit(&user("bob"), text("hacked"));
        let accepted = msg.edit(&user("alice"), text("hello again"));

        // then (期待する結果):
        assert_eq!(rejected, Err(DomainError::NotAuthorized("bob".to_string())));
        assert!(accepted.is_ok());
        assert_eq!(msg.text.unwrap().as_str(), "hello again");
    }

    #[test]
    fn test_mark_seen_is_monotonic() {
        // テスト項目: 既読フラグは一度 true になると戻らず、二度目の変更は報告されない
        // given (前提条件):
        let mut msg = message();

        // when (操作):
        let first = msg.mark_seen();
        let second = msg.mark_seen();

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert!(msg.seen);
    }

    #[test]
    fn test_conversation_membership() {
        // テスト項目: 会話の当事者判定と相手の取得
        // given (前提条件):
        let msg = message();

        // when (操作) / then (期待する結果):
        assert!(msg.is_between(&user("bob"), &user("alice")));
        assert!(!msg.is_between(&user("alice"), &user("carol")));
        assert_eq!(msg.peer_of(&user("alice")), &user("bob"));
        assert_eq!(msg.peer_of(&user("bob")), &user("alice"));
    }
}
