//! Error types for the hanashi client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport could not be opened or dropped
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP request failed before a response was decoded
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with `ok: false`
    #[error("Server rejected request ({status}): {code}")]
    Api {
        status: u16,
        code: String,
        message: Option<String>,
    },

    /// Server URL from the command line could not be parsed
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// User id is empty or contains whitespace
    #[error("Invalid user id: '{0}'")]
    InvalidUserId(String),

    /// Response body did not match the envelope contract
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),
}
