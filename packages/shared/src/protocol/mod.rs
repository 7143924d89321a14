//! Wire contract between the hanashi server and its clients.
//!
//! - `message`: the message object carried by both REST and real-time paths
//! - `event`: real-time events exchanged over the WebSocket
//! - `rest`: REST request bodies and the `{ok, data?, code?}` response envelope

pub mod event;
pub mod message;
pub mod rest;

pub use event::{ClientEvent, MessagesReadPayload, MessagesSeenPayload, ServerEvent};
pub use message::MessageDto;
pub use rest::{
    ApiResponse, CreateMessageRequest, MarkSeenResult, PeerDto, USER_ID_HEADER, UnreadCounts,
    UpdateMessageRequest, action,
};
