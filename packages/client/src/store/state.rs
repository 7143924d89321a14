//! Client-side projection of conversations.

use std::{cmp::Ordering, collections::HashSet};

use hanashi_shared::protocol::MessageDto;

use crate::connection::ConnectionState;

/// One row of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub peer_id: String,
    pub last_message: Option<MessageDto>,
    pub unread_count: u32,
}

impl ConversationSummary {
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            last_message: None,
            unread_count: 0,
        }
    }

    /// Replace `last_message` if `message` is the same message or a newer one.
    pub(crate) fn offer_last_message(&mut self, message: &MessageDto) {
        if let Some(current) = self.last_message.as_mut() {
            if current.id == message.id {
                merge_into(current, message);
                return;
            }
            if current.chronological_cmp(message) == Ordering::Greater {
                return;
            }
        }
        self.last_message = Some(message.clone());
    }
}

/// Everything the renderer needs, replaced as a whole after every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationState {
    pub self_id: String,
    /// Most recent conversation first.
    pub conversations: Vec<ConversationSummary>,
    pub selected_peer: Option<String>,
    /// Messages of the selected conversation, `createdAt` ascending then id.
    pub open_messages: Vec<MessageDto>,
    pub online_users: Vec<String>,
    pub connection: ConnectionState,
    /// Transient notification for the user.
    pub notice: Option<String>,
    /// Ids of messages already counted, so duplicates never count twice.
    pub(crate) applied_ids: HashSet<String>,
}

impl ReconciliationState {
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            conversations: Vec::new(),
            selected_peer: None,
            open_messages: Vec::new(),
            online_users: Vec::new(),
            connection: ConnectionState::Disconnected,
            notice: None,
            applied_ids: HashSet::new(),
        }
    }

    pub fn conversation(&self, peer: &str) -> Option<&ConversationSummary> {
        self.conversations.iter().find(|c| c.peer_id == peer)
    }

    pub fn is_online(&self, peer: &str) -> bool {
        self.online_users.iter().any(|id| id == peer)
    }

    pub fn is_selected(&self, peer: &str) -> bool {
        self.selected_peer.as_deref() == Some(peer)
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    pub(crate) fn conversation_mut(&mut self, peer: &str) -> &mut ConversationSummary {
        let index = match self.conversations.iter().position(|c| c.peer_id == peer) {
            Some(index) => index,
            None => {
                self.conversations.push(ConversationSummary::new(peer));
                self.conversations.len() - 1
            }
        };
        &mut self.conversations[index]
    }

    /// Most recent `last_message` first; conversations without one last, by peer id.
    pub(crate) fn sort_conversations(&mut self) {
        self.conversations
            .sort_by(|a, b| match (&a.last_message, &b.last_message) {
                (Some(x), Some(y)) => y.chronological_cmp(x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.peer_id.cmp(&b.peer_id),
            });
    }

    /// Forget applied ids no longer referenced by the open conversation or a
    /// summary's `last_message`.
    ///
    /// Only safe right after unread counts were replaced by the server's.
    pub(crate) fn prune_applied_ids(&mut self) {
        let referenced: HashSet<&str> = self
            .open_messages
            .iter()
            .chain(self.conversations.iter().filter_map(|c| c.last_message.as_ref()))
            .map(|m| m.id.as_str())
            .collect();
        self.applied_ids.retain(|id| referenced.contains(id.as_str()));
    }

    /// Insert into `open_messages` keeping `(createdAt, id)` order.
    ///
    /// A message already present (same id) is merged in place instead.
    /// Returns `true` if the message was new.
    pub(crate) fn merge_open_message(&mut self, message: &MessageDto) -> bool {
        if let Some(existing) = self.open_messages.iter_mut().find(|m| m.id == message.id) {
            merge_into(existing, message);
            return false;
        }
        let position = self
            .open_messages
            .partition_point(|m| m.chronological_cmp(message) == Ordering::Less);
        self.open_messages.insert(position, message.clone());
        true
    }
}

/// Take the newer copy of a message while never un-seeing it.
fn merge_into(existing: &mut MessageDto, incoming: &MessageDto) {
    let seen = existing.seen || incoming.seen;
    *existing = incoming.clone();
    existing.seen = seen;
}
