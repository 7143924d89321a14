//! Parsing of the lines typed at the prompt.

use crate::store::StoreEvent;

pub const HELP: &str = "\
Commands:
  /open <peer>       open the conversation with <peer>
  /edit <id> <text>  replace the text of one of your messages
  /peers             show conversations and unread counts
  /refresh           reload conversations from the server
  /help              show this help
  /quit              log out and exit
Anything else is sent to the open conversation.";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Edit { id: String, text: String },
    Peers,
    Refresh,
    Help,
    Quit,
    Send(String),
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        match name {
            "open" if !args.is_empty() && !args.contains(char::is_whitespace) => {
                Self::Open(args.to_string())
            }
            "open" => Self::Invalid("Usage: /open <peer>".to_string()),
            "edit" => match args.split_once(char::is_whitespace) {
                Some((id, text)) if !text.trim().is_empty() => Self::Edit {
                    id: id.to_string(),
                    text: text.trim().to_string(),
                },
                _ => Self::Invalid("Usage: /edit <id> <text>".to_string()),
            },
            "peers" => Self::Peers,
            "refresh" => Self::Refresh,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Invalid(format!("Unknown command '/{}'. Type /help", other)),
        }
    }

    /// The store event this command dispatches, if any.
    pub fn into_event(self) -> Option<StoreEvent> {
        match self {
            Self::Open(peer) => Some(StoreEvent::ConversationSelected(peer)),
            Self::Edit { id, text } => Some(StoreEvent::EditRequested { id, text }),
            Self::Refresh => Some(StoreEvent::RefreshRequested),
            Self::Send(text) => Some(StoreEvent::SendRequested(text)),
            Self::Peers | Self::Help | Self::Quit | Self::Invalid(_) => None,
        }
    }
}
