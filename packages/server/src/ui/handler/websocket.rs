//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, UserId},
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    /// Identity of the connecting user; absent or empty means anonymous.
    #[serde(default)]
    pub user_id: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> UserId (Domain Model)
    let user_id = match query.user_id.filter(|id| !id.trim().is_empty()) {
        None => None,
        Some(raw) => match UserId::new(raw.clone()) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Invalid userId '{}': {}", raw, e);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

/// Spawns a task that drains the connection's outbox into the WebSocket sender.
///
/// The task ends when the socket rejects a write or every sender handle of the
/// outbox has been dropped.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: Option<UserId>) {
    let (sender, mut receiver) = socket.split();

    let (tx, rx) = mpsc::channel(state.outbox_capacity);
    let connection = Connection::new(user_id.clone(), tx);
    let session_id = connection.session_id();

    if let Some(id) = &user_id {
        state.users.upsert(id.clone()).await;
    }

    // Writer first, so the presence snapshot sent on connect is flushed
    let mut send_task = pusher_loop(rx, sender);
    state.router.connect(connection.clone()).await;

    let router = state.router.clone();
    let inbound = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on session '{}': {}", session_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    router.handle_inbound(&inbound, text.as_str());
                }
                Message::Close(_) => {
                    tracing::debug!("Session '{}' requested close", session_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.router.disconnect(&connection).await;
}
