//! Domain layer: entities, value objects and the interfaces the use cases depend on.

pub mod entity;
pub mod error;
pub mod presence;
pub mod repository;
pub mod value_object;

pub use entity::Message;
pub use error::{DomainError, PushError, RepositoryError, ValueObjectError};
pub use presence::{Connection, Outbox, PresenceRegistry};
pub use repository::{MessageRepository, UserRepository};
pub use value_object::{
    MessageId, MessageIdFactory, MessageText, SessionId, Timestamp, UserId,
};
