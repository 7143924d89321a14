//! Shared application state.

use std::sync::Arc;

use hanashi_shared::time::Clock;

use crate::{
    domain::{MessageRepository, PresenceRegistry, UserRepository},
    usecase::{
        EventRouter, GetConversationUseCase, ListPeersUseCase, SendMessageUseCase,
        UnreadCountsUseCase, UpdateMessageUseCase,
    },
};

/// Default capacity of each connection's outbox.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

/// Shared application state
pub struct AppState {
    /// EventRouter（リアルタイム配送）
    pub router: Arc<EventRouter>,
    /// UserRepository（接続時のユーザー登録に使用）
    pub users: Arc<dyn UserRepository>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub update_message_usecase: Arc<UpdateMessageUseCase>,
    pub get_conversation_usecase: Arc<GetConversationUseCase>,
    pub list_peers_usecase: Arc<ListPeersUseCase>,
    pub unread_counts_usecase: Arc<UnreadCountsUseCase>,
    /// Capacity of the bounded outbox created per WebSocket connection
    pub outbox_capacity: usize,
}

impl AppState {
    /// Wire the use cases on top of the given stores and registry.
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        users: Arc<dyn UserRepository>,
        registry: Arc<dyn PresenceRegistry>,
        clock: Arc<dyn Clock>,
        outbox_capacity: usize,
    ) -> Self {
        let router = Arc::new(EventRouter::new(registry));
        Self {
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                messages.clone(),
                users.clone(),
                router.clone(),
                clock,
            )),
            update_message_usecase: Arc::new(UpdateMessageUseCase::new(
                messages.clone(),
                router.clone(),
            )),
            get_conversation_usecase: Arc::new(GetConversationUseCase::new(
                messages.clone(),
                router.clone(),
            )),
            list_peers_usecase: Arc::new(ListPeersUseCase::new(messages.clone(), users.clone())),
            unread_counts_usecase: Arc::new(UnreadCountsUseCase::new(messages)),
            router,
            users,
            outbox_capacity: outbox_capacity.max(1),
        }
    }
}
