//! Caller identity for REST handlers.
//!
//! Credential verification lives outside this service; the gateway in front of
//! it forwards the verified identity in the `x-user-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};
use hanashi_shared::protocol::USER_ID_HEADER;

use crate::{domain::UserId, ui::error::ApiError};

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        UserId::new(raw.to_string())
            .map(CurrentUser)
            .map_err(|_| ApiError::Unauthorized)
    }
}
