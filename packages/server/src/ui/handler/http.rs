//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hanashi_shared::protocol::{
    ApiResponse, CreateMessageRequest, MarkSeenResult, MessageDto, PeerDto, UnreadCounts,
    UpdateMessageRequest,
};

use crate::{
    ui::{error::ApiError, state::AppState},
    usecase::UpdateOutcome,
};

use super::auth::CurrentUser;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `GET /messages/users`: conversation partners of the caller.
pub async fn list_peers(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> ApiResult<Vec<PeerDto>> {
    let peers = state.list_peers_usecase.execute(&caller).await?;

    // Domain Model から DTO への変換
    let peers = peers
        .into_iter()
        .map(|peer| PeerDto {
            id: peer.id.into_string(),
            last_message: peer.last_message.map(MessageDto::from),
        })
        .collect();
    Ok(Json(ApiResponse::success(peers)))
}

/// `GET /messages/unread/counts`
pub async fn unread_counts(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
) -> ApiResult<UnreadCounts> {
    let counts = state.unread_counts_usecase.execute(&caller).await?;
    let counts: UnreadCounts = counts
        .into_iter()
        .map(|(peer, count)| (peer.into_string(), u32::try_from(count).unwrap_or(u32::MAX)))
        .collect();
    Ok(Json(ApiResponse::success(counts)))
}

/// `GET /messages/{id}`: history with peer `id`; marks their messages seen.
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(peer_id): Path<String>,
) -> ApiResult<Vec<MessageDto>> {
    let messages = state
        .get_conversation_usecase
        .execute(&caller, peer_id)
        .await?;
    Ok(Json(ApiResponse::success(
        messages.into_iter().map(MessageDto::from).collect(),
    )))
}

/// `POST /messages`
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    body: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MessageDto>>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let message = state.send_message_usecase.execute(&caller, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(MessageDto::from(message))),
    ))
}

/// `PUT /messages/{id}`: `markSeen` (id = peer) or `edit` (id = message).
pub async fn update_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateMessageRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let response = match state
        .update_message_usecase
        .execute(&caller, id, request)
        .await?
    {
        UpdateOutcome::MarkedSeen(updated) => Json(ApiResponse::success(MarkSeenResult {
            updated: updated as u64,
        }))
        .into_response(),
        UpdateOutcome::Edited(message) => {
            Json(ApiResponse::success(MessageDto::from(message))).into_response()
        }
    };
    Ok(response)
}
