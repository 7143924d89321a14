//! hanashi server
//!
//! Presence tracking and real-time delivery for two-user direct messaging.
//!
//! - `domain`: value objects, the `Message` entity, presence and repository traits
//! - `infrastructure`: in-memory implementations and DTO conversion
//! - `usecase`: REST business logic and the [`usecase::EventRouter`]
//! - `ui`: axum router, handlers and the [`ui::Server`]

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
