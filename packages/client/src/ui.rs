//! Terminal rendering of store snapshots.

use std::{collections::HashMap, io::Write};

use hanashi_shared::protocol::MessageDto;

use crate::{formatter::MessageFormatter, store::ReconciliationState};

/// Redisplay the prompt after printing output
pub fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}

/// Turns consecutive snapshots into the lines that changed between them.
pub struct Renderer {
    previous: ReconciliationState,
}

impl Renderer {
    pub fn new(initial: ReconciliationState) -> Self {
        Self { previous: initial }
    }

    /// Lines to print for the transition to `next`.
    pub fn render(&mut self, next: &ReconciliationState) -> Vec<String> {
        let previous = &self.previous;
        let mut lines = Vec::new();

        if next.connection != previous.connection {
            lines.push(MessageFormatter::format_connection(next.connection));
        }
        if next.notice != previous.notice
            && let Some(notice) = &next.notice
        {
            lines.push(MessageFormatter::format_notice(notice));
        }
        if next.online_users != previous.online_users && next.connection.is_connected() {
            lines.push(MessageFormatter::format_presence(
                &next.online_users,
                &next.self_id,
            ));
        }

        if next.selected_peer != previous.selected_peer {
            if let Some(peer) = &next.selected_peer {
                lines.push(MessageFormatter::format_conversation_header(
                    peer,
                    next.is_online(peer),
                ));
            }
            lines.extend(
                next.open_messages
                    .iter()
                    .map(|m| MessageFormatter::format_message(m, &next.self_id)),
            );
        } else {
            let known: HashMap<&str, &MessageDto> = previous
                .open_messages
                .iter()
                .map(|m| (m.id.as_str(), m))
                .collect();
            lines.extend(
                next.open_messages
                    .iter()
                    .filter(|m| known.get(m.id.as_str()).copied() != Some(*m))
                    .map(|m| MessageFormatter::format_message(m, &next.self_id)),
            );
        }

        self.previous = next.clone();
        lines
    }
}

#[cfg(test)]
mod tests {
    use crate::{connection::ConnectionState, store::StoreEvent};

    use super::*;

    fn message(id: &str, from: &str, to: &str, created_at: i64) -> MessageDto {
        MessageDto {
            id: id.to_string(),
            sender_id: from.to_string(),
            receiver_id: to.to_string(),
            text: Some(format!("text {}", id)),
            image_url: None,
            seen: false,
            created_at,
        }
    }

    #[test]
    fn test_render_prints_header_and_history_on_open() {
        // テスト項目: 会話を開くとヘッダーと履歴全体が表示される
        // given (前提条件):
        let mut state = ReconciliationState::new("alice");
        let mut renderer = Renderer::new(state.clone());

        // when (操作):
        state.apply(StoreEvent::ConversationSelected("bob".to_string()));
        state.apply(StoreEvent::HistoryLoaded {
            peer: "bob".to_string(),
            messages: vec![message("m1", "bob", "alice", 1), message("m2", "alice", "bob", 2)],
        });
        let lines = renderer.render(&state);

        // then (期待する結果):
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("@bob (offline)"));
        assert!(lines[1].contains("#m1"));
        assert!(lines[2].contains("#m2"));
    }

    #[test]
    fn test_render_prints_only_new_or_changed_messages() {
        // テスト項目: 開いている会話では追加・変更されたメッセージだけが表示される
        // given (前提条件):
        let mut state = ReconciliationState::new("alice");
        state.apply(StoreEvent::ConversationSelected("bob".to_string()));
        state.apply(StoreEvent::MessageSent(message("m1", "alice", "bob", 1)));
        state.apply(StoreEvent::MessageSent(message("m2", "alice", "bob", 2)));
        let mut renderer = Renderer::new(state.clone());

        // when (操作):
        state.apply(StoreEvent::IncomingMessage(message("m3", "bob", "alice", 3)));
        let mut edited = message("m1", "alice", "bob", 1);
        edited.text = Some("fixed".to_string());
        state.apply(StoreEvent::MessageEdited(edited));
        let lines = renderer.render(&state);

        // then (期待する結果):
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("fixed"));
        assert!(lines[1].contains("#m3"));
        assert!(renderer.render(&state).is_empty());
    }

    #[test]
    fn test_render_reports_connection_and_notice() {
        // テスト項目: 接続状態の変化と通知が表示される
        // given (前提条件):
        let mut state = ReconciliationState::new("alice");
        let mut renderer = Renderer::new(state.clone());

        // when (操作):
        state.apply(StoreEvent::ConnectionChanged(ConnectionState::Connecting {
            attempt: 2,
        }));
        state.apply(StoreEvent::ConnectionError("refused".to_string()));
        let lines = renderer.render(&state);

        // then (期待する結果):
        assert_eq!(
            lines,
            vec![
                "* connecting (attempt 2)".to_string(),
                "! Connection error. Trying to reconnect...".to_string(),
            ]
        );
    }
}
