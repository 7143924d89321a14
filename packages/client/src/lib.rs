//! hanashi client
//!
//! - `api`: REST calls behind the [`api::ChatApi`] trait
//! - `connection`: WebSocket lifecycle with bounded reconnection
//! - `store`: the reconciliation store that merges pushed events with REST results
//! - `formatter`, `ui`, `command`, `runner`: the interactive terminal front end

pub mod api;
pub mod command;
pub mod connection;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod store;
pub mod ui;

pub use runner::{ClientConfig, run_client};
