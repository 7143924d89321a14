//! Code shared by the hanashi server and client.
//!
//! - `protocol`: real-time event and REST wire contract
//! - `logger`: tracing subscriber setup
//! - `time`: clock abstraction and timestamp formatting

pub mod logger;
pub mod protocol;
pub mod time;
