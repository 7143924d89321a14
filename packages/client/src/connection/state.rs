//! Connection state as seen by the rest of the client.

use std::fmt;

/// `Disconnected → Connecting → Connected → (Connecting | Disconnected)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Opening transport number `attempt` (1-based) since the last success.
    Connecting { attempt: u32 },
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting { attempt } => write!(f, "connecting (attempt {})", attempt),
            Self::Connected => f.write_str("connected"),
        }
    }
}
