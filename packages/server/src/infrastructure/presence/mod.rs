//! Presence registry implementations.
//!
//! - `inmemory`: mutex-guarded maps inside the server process

pub mod inmemory;

pub use inmemory::InMemoryPresenceRegistry;
