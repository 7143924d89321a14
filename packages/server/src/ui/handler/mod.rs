//! Request handlers.

pub mod auth;
pub mod http;
pub mod websocket;

pub use http::{
    get_conversation, health_check, list_peers, send_message, unread_counts, update_message,
};
pub use websocket::websocket_handler;
