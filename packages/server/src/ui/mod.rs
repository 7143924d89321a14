//! UI layer: HTTP and WebSocket surface of the server.

pub mod error;
pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
