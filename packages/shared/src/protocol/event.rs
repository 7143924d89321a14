//! Real-time events carried over the WebSocket.
//!
//! Every frame is a JSON text frame shaped as `{"event": <name>, "data": <payload>}`.
//! Event names are part of the wire contract and must not change.

use serde::{Deserialize, Serialize};

use super::message::MessageDto;

/// Payload of `messagesSeen`: `receiverId` has seen the messages `senderId` sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesSeenPayload {
    pub sender_id: String,
    pub receiver_id: String,
}

/// Payload of `messagesRead`: messages from `senderId` were read from another session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadPayload {
    pub sender_id: String,
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full snapshot of the identities currently registered (never a diff).
    GetOnlineUsers(Vec<String>),
    /// A message addressed to the receiving user was created.
    NewMessage(MessageDto),
    /// The receiving user's outgoing messages were seen by the peer.
    MessagesSeen(MessagesSeenPayload),
    /// A message in one of the receiving user's conversations was edited.
    MessageEdited(MessageDto),
    /// The receiving user read messages from `senderId` in another session.
    MessagesRead(MessagesReadPayload),
}

impl ServerEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::GetOnlineUsers(_) => "getOnlineUsers",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::MessagesSeen(_) => "messagesSeen",
            ServerEvent::MessageEdited(_) => "messageEdited",
            ServerEvent::MessagesRead(_) => "messagesRead",
        }
    }

    /// Encode as a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Client → server events.
///
/// These are legacy relay events: message creation, edits and seen-status all
/// flow through REST, and the server pushes the resulting events itself.
/// The server accepts and ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    NewMessage(serde_json::Value),
    MessagesSeen(MessagesSeenPayload),
    MessageEdited(MessageDto),
}

impl ClientEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::NewMessage(_) => "newMessage",
            ClientEvent::MessagesSeen(_) => "messagesSeen",
            ClientEvent::MessageEdited(_) => "messageEdited",
        }
    }

    /// Decode a text frame.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_users_wire_shape() {
        // テスト項目: getOnlineUsers が {"event", "data"} 形式で直列化される
        // given (前提条件):
        let event = ServerEvent::GetOnlineUsers(vec!["alice".to_string(), "bob".to_string()]);

        // when (操作):
        let json = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({"event": "getOnlineUsers", "data": ["alice", "bob"]})
        );
        assert_eq!(event.name(), "getOnlineUsers");
    }

    #[test]
    fn test_messages_seen_wire_shape() {
        // テスト項目: messagesSeen のペイロードが senderId / receiverId を持つ
        // given (前提条件):
        let event = ServerEvent::MessagesSeen(MessagesSeenPayload {
            sender_id: "alice".to_string(),
            receiver_id: "bob".to_string(),
        });

        // when (操作):
        let json = event.to_json().unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"event":"messagesSeen","data":{"senderId":"alice","receiverId":"bob"}}"#
        );
    }

    #[test]
    fn test_decode_new_message_event() {
        // テスト項目: newMessage フレームがメッセージ付きでデコードされる
        // given (前提条件):
        let frame = r#"{"event":"newMessage","data":{"id":"m1","senderId":"alice","receiverId":"bob","text":"hi","seen":false,"createdAt":42}}"#;

        // when (操作):
        let event = ServerEvent::from_json(frame).unwrap();

        // then (期待する結果):
        match event {
            ServerEvent::NewMessage(msg) => {
                assert_eq!(msg.id, "m1");
                assert_eq!(msg.text.as_deref(), Some("hi"));
                assert_eq!(msg.created_at, 42);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed_client_event_fails() {
        // テスト項目: 必須フィールドが欠けたクライアントイベントはデコードに失敗する
        // given (前提条件):
        let frames = [
            r#"{"event":"messagesSeen","data":{"senderId":"alice"}}"#,
            r#"{"event":"typing","data":{}}"#,
            "not json",
        ];

        // when (操作) / then (期待する結果):
        for frame in frames {
            assert!(ClientEvent::from_json(frame).is_err(), "frame: {}", frame);
        }
    }
}
