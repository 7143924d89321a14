//! In-memory stores standing in for the external document database.

pub mod message;
pub mod user;

pub use message::InMemoryMessageRepository;
pub use user::InMemoryUserRepository;
