//! REST request bodies and response envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::message::MessageDto;

/// Header carrying the authenticated caller's identity on REST requests.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Values accepted in the `action` field of `PUT /messages/{id}`.
pub mod action {
    /// Mark every unseen message from the peer `{id}` to the caller as seen.
    pub const MARK_SEEN: &str = "markSeen";
    /// Replace the text of message `{id}`; only its sender may do this.
    pub const EDIT: &str = "edit";
}

/// Response envelope wrapping every REST response: `{ok, data?, code?, message?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable error code, e.g. `ERRORS.MESSAGE_NOT_FOUND`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable detail for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            code: None,
            message: None,
        }
    }

    /// Failed response with an error code.
    pub fn failure(code: impl Into<String>, message: Option<String>) -> Self {
        Self {
            ok: false,
            data: None,
            code: Some(code.into()),
            message,
        }
    }
}

/// Body of `POST /messages`.
///
/// Fields are optional on the wire so the server can answer missing values
/// with a precise error code instead of a generic decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub receiver_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Body of `PUT /messages/{id}`; see [`action`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMessageRequest {
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl UpdateMessageRequest {
    pub fn mark_seen() -> Self {
        Self {
            action: Some(action::MARK_SEEN.to_string()),
            text: None,
        }
    }

    pub fn edit(text: impl Into<String>) -> Self {
        Self {
            action: Some(action::EDIT.to_string()),
            text: Some(text.into()),
        }
    }
}

/// `data` of a successful `markSeen` update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSeenResult {
    /// Messages that flipped from unseen to seen.
    pub updated: u64,
}

/// Entry of `GET /messages/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDto {
    pub id: String,
    #[serde(default)]
    pub last_message: Option<MessageDto>,
}

/// Body of `GET /messages/unread/counts`: peer id → unseen messages from that peer.
pub type UnreadCounts = BTreeMap<String, u32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_envelope_omits_data() {
        // テスト項目: 失敗レスポンスは data を含まず code を含む
        // given (前提条件):
        let response: ApiResponse<MessageDto> = ApiResponse::failure("ERRORS.INVALID_ID", None);

        // when (操作):
        let json = serde_json::to_value(&response).unwrap();

        // then (期待する結果):
        assert_eq!(json, serde_json::json!({"ok": false, "code": "ERRORS.INVALID_ID"}));
    }

    #[test]
    fn test_success_envelope_round_trips_unread_counts() {
        // テスト項目: 未読数マップを含む成功レスポンスをデコードできる
        // given (前提条件):
        let body = r#"{"ok":true,"data":{"alice":2,"carol":1}}"#;

        // when (操作):
        let response: ApiResponse<UnreadCounts> = serde_json::from_str(body).unwrap();

        // then (期待する結果):
        assert!(response.ok);
        let counts = response.data.unwrap();
        assert_eq!(counts.get("alice"), Some(&2));
        assert_eq!(counts.get("carol"), Some(&1));
    }

    #[test]
    fn test_update_request_constructors() {
        // テスト項目: markSeen / edit の PUT ボディが正しい action を持つ
        // given (前提条件) / when (操作):
        let seen = serde_json::to_value(UpdateMessageRequest::mark_seen()).unwrap();
        let edit = serde_json::to_value(UpdateMessageRequest::edit("fixed")).unwrap();

        // then (期待する結果):
        assert_eq!(seen, serde_json::json!({"action": "markSeen"}));
        assert_eq!(edit, serde_json::json!({"action": "edit", "text": "fixed"}));
    }
}
