//! Reducer of the reconciliation store.
//!
//! [`ReconciliationState::apply`] is the only place the client state changes.
//! It consumes one [`StoreEvent`] (a pushed server event, a REST result or a
//! user command) and returns the [`Effect`]s the runtime must perform. It does
//! no I/O itself.

use hanashi_shared::protocol::{
    MessageDto, MessagesReadPayload, MessagesSeenPayload, PeerDto, ServerEvent, UnreadCounts,
};

use crate::connection::ConnectionState;

use super::state::ReconciliationState;

/// Notice shown while the transport is being re-established.
pub const RECONNECTING_NOTICE: &str = "Connection error. Trying to reconnect...";

/// Inputs of the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    // ----- user commands -----
    /// Open the conversation with a peer.
    ConversationSelected(String),
    /// Send text to the selected peer.
    SendRequested(String),
    /// Edit one of our messages.
    EditRequested { id: String, text: String },
    /// Re-fetch peers and unread counts.
    RefreshRequested,

    // ----- pushed by the server -----
    PresenceUpdated(Vec<String>),
    IncomingMessage(MessageDto),
    MessageEdited(MessageDto),
    MessagesSeen(MessagesSeenPayload),
    MessagesRead(MessagesReadPayload),

    // ----- REST results -----
    HistoryLoaded { peer: String, messages: Vec<MessageDto> },
    MessageSent(MessageDto),
    PeersLoaded(Vec<PeerDto>),
    UnreadCountsLoaded(UnreadCounts),
    RequestFailed(String),

    // ----- connection lifecycle -----
    ConnectionChanged(ConnectionState),
    ConnectionError(String),
    LoggedOut,
}

impl From<ServerEvent> for StoreEvent {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::GetOnlineUsers(ids) => Self::PresenceUpdated(ids),
            ServerEvent::NewMessage(message) => Self::IncomingMessage(message),
            ServerEvent::MessagesSeen(payload) => Self::MessagesSeen(payload),
            ServerEvent::MessageEdited(message) => Self::MessageEdited(message),
            ServerEvent::MessagesRead(payload) => Self::MessagesRead(payload),
        }
    }
}

/// Side effects requested by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchHistory(String),
    MarkSeen(String),
    /// Re-fetch peers and unread counts.
    Refresh,
    SendMessage { peer: String, text: String },
    EditMessage { id: String, text: String },
    /// Tell the user about something outside the open conversation.
    Notify(String),
}

impl ReconciliationState {
    /// Apply one event and return the effects to run.
    pub fn apply(&mut self, event: StoreEvent) -> Vec<Effect> {
        match event {
            StoreEvent::ConversationSelected(peer) => self.select_conversation(peer),
            StoreEvent::SendRequested(text) => match &self.selected_peer {
                Some(peer) => vec![Effect::SendMessage {
                    peer: peer.clone(),
                    text,
                }],
                None => {
                    self.notice = Some("Open a conversation first".to_string());
                    vec![]
                }
            },
            StoreEvent::EditRequested { id, text } => vec![Effect::EditMessage { id, text }],
            StoreEvent::RefreshRequested => vec![Effect::Refresh],

            StoreEvent::PresenceUpdated(ids) => {
                self.online_users = ids;
                vec![]
            }
            StoreEvent::IncomingMessage(message) | StoreEvent::MessageSent(message) => {
                self.apply_message(message)
            }
            StoreEvent::MessageEdited(message) => {
                self.apply_message_edited(message);
                vec![]
            }
            StoreEvent::MessagesSeen(payload) => {
                self.apply_messages_seen(&payload.sender_id, &payload.receiver_id);
                vec![]
            }
            StoreEvent::MessagesRead(payload) => {
                self.apply_messages_read(&payload.sender_id);
                vec![]
            }

            StoreEvent::HistoryLoaded { peer, messages } => self.apply_history(peer, messages),
            StoreEvent::PeersLoaded(peers) => {
                self.apply_peers(peers);
                vec![]
            }
            StoreEvent::UnreadCountsLoaded(counts) => {
                self.apply_unread_counts(counts);
                vec![]
            }
            StoreEvent::RequestFailed(reason) => {
                // seen は表示用のため、失敗してもロールバックしない
                self.notice = Some(reason);
                vec![]
            }

            StoreEvent::ConnectionChanged(state) => self.apply_connection(state),
            StoreEvent::ConnectionError(reason) => {
                tracing::debug!("Transport error: {}", reason);
                self.notice = Some(RECONNECTING_NOTICE.to_string());
                vec![]
            }
            StoreEvent::LoggedOut => {
                self.connection = ConnectionState::Disconnected;
                self.online_users.clear();
                self.notice = None;
                vec![]
            }
        }
    }

    fn select_conversation(&mut self, peer: String) -> Vec<Effect> {
        if peer == self.self_id {
            self.notice = Some("You cannot open a conversation with yourself".to_string());
            return vec![];
        }
        self.conversation_mut(&peer).unread_count = 0;
        self.sort_conversations();
        self.open_messages.clear();
        self.selected_peer = Some(peer.clone());
        vec![Effect::FetchHistory(peer)]
    }

    /// A message involving us: pushed by the server or returned by our own send.
    fn apply_message(&mut self, message: MessageDto) -> Vec<Effect> {
        if message.sender_id != self.self_id && message.receiver_id != self.self_id {
            tracing::debug!("Ignoring message '{}' not addressed to us", message.id);
            return vec![];
        }
        let peer = message.peer_of(&self.self_id).to_string();
        let first_time = self.applied_ids.insert(message.id.clone());
        let inbound = message.receiver_id == self.self_id;
        let selected = self.is_selected(&peer);

        let mut effects = Vec::new();
        let summary = self.conversation_mut(&peer);
        summary.offer_last_message(&message);
        if inbound && !selected && first_time {
            summary.unread_count += 1;
            effects.push(Effect::Notify(format!("New message from {}", peer)));
        }

        if selected {
            let mut message = message;
            if inbound {
                message.seen = true;
                effects.push(Effect::MarkSeen(peer.clone()));
            }
            self.merge_open_message(&message);
            self.conversation_mut(&peer).offer_last_message(&message);
        }

        self.sort_conversations();
        effects
    }

    fn apply_message_edited(&mut self, message: MessageDto) {
        if let Some(existing) = self.open_messages.iter_mut().find(|m| m.id == message.id) {
            let seen = existing.seen || message.seen;
            *existing = message.clone();
            existing.seen = seen;
        }
        let peer = message.peer_of(&self.self_id).to_string();
        if let Some(summary) = self.conversations.iter_mut().find(|c| c.peer_id == peer) {
            let is_last = summary
                .last_message
                .as_ref()
                .is_some_and(|last| last.id == message.id);
            if is_last {
                summary.offer_last_message(&message);
            }
        }
    }

    /// `receiver` has seen the messages `sender` sent them.
    fn apply_messages_seen(&mut self, sender: &str, receiver: &str) {
        if sender != self.self_id {
            return;
        }
        if self.is_selected(receiver) {
            for message in self
                .open_messages
                .iter_mut()
                .filter(|m| m.sender_id == sender && m.receiver_id == receiver)
            {
                message.seen = true;
            }
        }
        mark_last_seen(self, receiver, sender);
    }

    /// Another session of ours read the messages `sender` sent us.
    fn apply_messages_read(&mut self, sender: &str) {
        if let Some(summary) = self.conversations.iter_mut().find(|c| c.peer_id == sender) {
            summary.unread_count = 0;
        }
        if self.is_selected(sender) {
            let me = &self.self_id;
            for message in self
                .open_messages
                .iter_mut()
                .filter(|m| m.sender_id == sender && &m.receiver_id == me)
            {
                message.seen = true;
            }
        }
        mark_last_seen(self, sender, sender);
    }

    fn apply_history(&mut self, peer: String, messages: Vec<MessageDto>) -> Vec<Effect> {
        if !self.is_selected(&peer) {
            tracing::debug!("Discarding stale history for '{}'", peer);
            return vec![];
        }

        let mut received = false;
        for mut message in messages {
            if !message.is_between(&self.self_id, &peer) {
                continue;
            }
            if message.receiver_id == self.self_id {
                message.seen = true;
                received = true;
            }
            self.applied_ids.insert(message.id.clone());
            self.merge_open_message(&message);
        }

        if let Some(last) = self.open_messages.last().cloned() {
            self.conversation_mut(&peer).offer_last_message(&last);
            self.sort_conversations();
        }

        if received {
            vec![Effect::MarkSeen(peer)]
        } else {
            vec![]
        }
    }

    fn apply_peers(&mut self, peers: Vec<PeerDto>) {
        for peer in peers {
            if peer.id == self.self_id {
                continue;
            }
            if let Some(last) = &peer.last_message {
                self.applied_ids.insert(last.id.clone());
            }
            let summary = self.conversation_mut(&peer.id);
            if let Some(last) = &peer.last_message {
                summary.offer_last_message(last);
            }
        }
        self.sort_conversations();
    }

    fn apply_unread_counts(&mut self, counts: UnreadCounts) {
        for peer in counts.keys() {
            if peer != &self.self_id {
                self.conversation_mut(peer);
            }
        }
        let selected = self.selected_peer.clone();
        for summary in &mut self.conversations {
            summary.unread_count = if selected.as_deref() == Some(summary.peer_id.as_str()) {
                0
            } else {
                counts.get(&summary.peer_id).copied().unwrap_or(0)
            };
        }
        self.prune_applied_ids();
        self.sort_conversations();
    }

    fn apply_connection(&mut self, state: ConnectionState) -> Vec<Effect> {
        let was_connected = self.connection.is_connected();
        self.connection = state;
        match state {
            ConnectionState::Connected if !was_connected => {
                self.notice = None;
                // 切断中に取りこぼしたイベントを REST で取り直す
                let mut effects = vec![Effect::Refresh];
                if let Some(peer) = &self.selected_peer {
                    effects.push(Effect::FetchHistory(peer.clone()));
                }
                effects
            }
            ConnectionState::Connected => vec![],
            ConnectionState::Connecting { .. } | ConnectionState::Disconnected => {
                self.online_users.clear();
                vec![]
            }
        }
    }
}

/// Mark the conversation's last message seen if `sender` wrote it.
fn mark_last_seen(state: &mut ReconciliationState, peer: &str, sender: &str) {
    if let Some(last) = state
        .conversations
        .iter_mut()
        .find(|c| c.peer_id == peer)
        .and_then(|c| c.last_message.as_mut())
        .filter(|m| m.sender_id == sender)
    {
        last.seen = true;
    }
}
