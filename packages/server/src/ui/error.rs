//! HTTP error responses.
//!
//! Every failure is rendered as the `{ok: false, code, message}` envelope with
//! an `ERRORS.*` code the client can match on.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hanashi_shared::protocol::ApiResponse;
use thiserror::Error;

use crate::usecase::{QueryError, SendMessageError, UpdateMessageError};

/// Error codes returned in the `code` field.
pub mod code {
    pub const UNAUTHORIZED: &str = "ERRORS.UNAUTHORIZED";
    pub const INVALID_BODY: &str = "ERRORS.INVALID_BODY";
    pub const RECEIVER_REQUIRED: &str = "ERRORS.RECEIVER_REQUIRED";
    pub const INVALID_RECEIVER_ID: &str = "ERRORS.INVALID_RECEIVER_ID";
    pub const MESSAGE_CONTENT_REQUIRED: &str = "ERRORS.MESSAGE_CONTENT_REQUIRED";
    pub const INVALID_CONTENT: &str = "ERRORS.INVALID_CONTENT";
    pub const ACTION_REQUIRED: &str = "ERRORS.ACTION_REQUIRED";
    pub const INVALID_ACTION: &str = "ERRORS.INVALID_ACTION";
    pub const INVALID_ID: &str = "ERRORS.INVALID_ID";
    pub const TEXT_REQUIRED: &str = "ERRORS.TEXT_REQUIRED";
    pub const MESSAGE_NOT_FOUND: &str = "ERRORS.MESSAGE_NOT_FOUND";
    pub const NOT_AUTHORIZED: &str = "ERRORS.NOT_AUTHORIZED";
    pub const SERVER_ERROR: &str = "ERRORS.SERVER_ERROR";
}

/// Failure of a REST handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid caller identity.
    #[error("authentication required")]
    Unauthorized,

    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    SendMessage(#[from] SendMessageError),

    #[error(transparent)]
    UpdateMessage(#[from] UpdateMessageError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ApiError {
    /// HTTP status and `ERRORS.*` code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, code::UNAUTHORIZED),
            Self::InvalidBody(_) => (StatusCode::BAD_REQUEST, code::INVALID_BODY),
            Self::SendMessage(e) => match e {
                SendMessageError::ReceiverRequired => {
                    (StatusCode::BAD_REQUEST, code::RECEIVER_REQUIRED)
                }
                SendMessageError::InvalidReceiverId(_) => {
                    (StatusCode::BAD_REQUEST, code::INVALID_RECEIVER_ID)
                }
                SendMessageError::ContentRequired => {
                    (StatusCode::BAD_REQUEST, code::MESSAGE_CONTENT_REQUIRED)
                }
                SendMessageError::InvalidContent(_) => {
                    (StatusCode::BAD_REQUEST, code::INVALID_CONTENT)
                }
                SendMessageError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, code::SERVER_ERROR)
                }
            },
            Self::UpdateMessage(e) => match e {
                UpdateMessageError::ActionRequired => {
                    (StatusCode::BAD_REQUEST, code::ACTION_REQUIRED)
                }
                UpdateMessageError::InvalidAction(_) => {
                    (StatusCode::BAD_REQUEST, code::INVALID_ACTION)
                }
                UpdateMessageError::InvalidId(_) => (StatusCode::BAD_REQUEST, code::INVALID_ID),
                UpdateMessageError::TextRequired => (StatusCode::BAD_REQUEST, code::TEXT_REQUIRED),
                UpdateMessageError::InvalidContent(_) => {
                    (StatusCode::BAD_REQUEST, code::INVALID_CONTENT)
                }
                UpdateMessageError::MessageNotFound(_) => {
                    (StatusCode::NOT_FOUND, code::MESSAGE_NOT_FOUND)
                }
                UpdateMessageError::NotAuthorized(_) => (StatusCode::FORBIDDEN, code::NOT_AUTHORIZED),
                UpdateMessageError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, code::SERVER_ERROR)
                }
            },
            Self::Query(e) => match e {
                QueryError::InvalidId(_) => (StatusCode::BAD_REQUEST, code::INVALID_ID),
                QueryError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, code::SERVER_ERROR)
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected with {}: {}", code, self);
        }
        let body = ApiResponse::<()>::failure(code, Some(self.to_string()));
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RepositoryError, ValueObjectError};

    #[test]
    fn test_status_and_code_mapping() {
        // テスト項目: ユースケースのエラーが HTTP ステータスとエラーコードに対応付けられる
        // given (前提条件):
        let cases = vec![
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED, code::UNAUTHORIZED),
            (
                SendMessageError::ReceiverRequired.into(),
                StatusCode::BAD_REQUEST,
                code::RECEIVER_REQUIRED,
            ),
            (
                UpdateMessageError::NotAuthorized("alice".to_string()).into(),
                StatusCode::FORBIDDEN,
                code::NOT_AUTHORIZED,
            ),
            (
                UpdateMessageError::MessageNotFound("m1".to_string()).into(),
                StatusCode::NOT_FOUND,
                code::MESSAGE_NOT_FOUND,
            ),
            (
                QueryError::InvalidId(ValueObjectError::UserIdEmpty).into(),
                StatusCode::BAD_REQUEST,
                code::INVALID_ID,
            ),
            (
                QueryError::Repository(RepositoryError::DuplicateMessage("m1".to_string()))
                    .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                code::SERVER_ERROR,
            ),
        ];

        for (error, status, expected_code) in cases {
            // when (操作):
            let actual = error.status_and_code();

            // then (期待する結果):
            assert_eq!(actual, (status, expected_code), "{:?}", error);
        }
    }
}
