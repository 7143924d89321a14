//! UseCase layer
//!
//! REST の各エンドポイントとリアルタイム配送のビジネスロジック。
//! 永続化は Repository trait、配送は [`EventRouter`] に委譲する。

pub mod error;
pub mod event_router;
pub mod get_conversation;
pub mod list_peers;
pub mod send_message;
pub mod update_message;

pub use error::{QueryError, SendMessageError, UpdateMessageError};
pub use event_router::{EventRouter, InboundOutcome};
pub use get_conversation::GetConversationUseCase;
pub use list_peers::{ListPeersUseCase, Peer, UnreadCountsUseCase};
pub use send_message::SendMessageUseCase;
pub use update_message::{UpdateMessageUseCase, UpdateOutcome};
