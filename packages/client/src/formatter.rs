//! Message formatting utilities for client display.

use hanashi_shared::{protocol::MessageDto, time::timestamp_to_clock_time};

use crate::{
    connection::ConnectionState,
    store::{ConversationSummary, ReconciliationState},
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the conversation list, most recent first.
    ///
    /// # Arguments
    ///
    /// * `state` - Current store snapshot
    ///
    /// # Returns
    ///
    /// A formatted string with one line per conversation
    pub fn format_conversation_list(state: &ReconciliationState) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n", RULE));
        output.push_str(&format!(
            "Conversations ({} unread):\n",
            state.total_unread()
        ));

        if state.conversations.is_empty() {
            output.push_str("(No conversations)\n");
        } else {
            for summary in &state.conversations {
                output.push_str(&Self::format_conversation_row(summary, state));
                output.push('\n');
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    fn format_conversation_row(summary: &ConversationSummary, state: &ReconciliationState) -> String {
        let marker = if state.is_selected(&summary.peer_id) {
            ">"
        } else {
            " "
        };
        let presence = if state.is_online(&summary.peer_id) {
            " (online)"
        } else {
            ""
        };
        let unread = if summary.unread_count > 0 {
            format!(" [{} unread]", summary.unread_count)
        } else {
            String::new()
        };
        let preview = summary
            .last_message
            .as_ref()
            .map(|m| format!(" - {}", preview_of(m)))
            .unwrap_or_default();
        format!(
            "{} {}{}{}{}",
            marker, summary.peer_id, presence, unread, preview
        )
    }

    /// Format the header printed when a conversation is opened.
    pub fn format_conversation_header(peer: &str, online: bool) -> String {
        let presence = if online { "online" } else { "offline" };
        format!("\n{}\n@{} ({})\n{}\n", RULE, peer, presence, RULE)
    }

    /// Format one message of the open conversation.
    ///
    /// Our own messages are shown as `me` and carry a `(seen)` marker once
    /// the peer has read them. The id is shown so messages can be edited.
    pub fn format_message(message: &MessageDto, self_id: &str) -> String {
        let mine = message.sender_id == self_id;
        let author = if mine { "me" } else { message.sender_id.as_str() };
        let seen = if mine && message.seen { " (seen)" } else { "" };
        format!(
            "[{}] @{}: {}{}  #{}",
            timestamp_to_clock_time(message.created_at),
            author,
            preview_of(message),
            seen,
            message.id
        )
    }

    /// Format the list of online users.
    pub fn format_presence(online_users: &[String], self_id: &str) -> String {
        let others: Vec<&str> = online_users
            .iter()
            .map(String::as_str)
            .filter(|id| *id != self_id)
            .collect();
        if others.is_empty() {
            "Online: (nobody else)".to_string()
        } else {
            format!("Online: {}", others.join(", "))
        }
    }

    /// Format a connection state change.
    pub fn format_connection(state: ConnectionState) -> String {
        format!("* {}", state)
    }

    /// Format a notification or error notice.
    pub fn format_notice(text: &str) -> String {
        format!("! {}", text)
    }
}

fn preview_of(message: &MessageDto) -> String {
    match (&message.text, &message.image_url) {
        (Some(text), None) => text.clone(),
        (Some(text), Some(url)) => format!("{} [image: {}]", text, url),
        (None, Some(url)) => format!("[image: {}]", url),
        (None, None) => String::new(),
    }
}
