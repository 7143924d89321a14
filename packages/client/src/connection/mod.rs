//! Connection lifecycle: one WebSocket transport per logged-in user, kept
//! alive with bounded reconnection.

mod manager;
pub mod policy;
mod state;

pub use manager::ConnectionManager;
pub use policy::ReconnectPolicy;
pub use state::ConnectionState;
