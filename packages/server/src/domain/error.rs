//! Domain layer errors.

use thiserror::Error;

/// Validation errors raised when constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    UserIdEmpty,

    #[error("user id is too long ({0} bytes)")]
    UserIdTooLong(usize),

    #[error("user id '{0}' contains whitespace")]
    UserIdInvalid(String),

    #[error("message id must not be empty")]
    MessageIdEmpty,

    #[error("message text must not be empty")]
    MessageTextEmpty,

    #[error("message text is too long ({0} characters)")]
    MessageTextTooLong(usize),
}

/// Business rule violations on entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Neither text nor image was given.
    #[error("message needs text or an image")]
    EmptyContent,

    /// Someone other than the sender tried to edit a message.
    #[error("user '{0}' is not the sender of this message")]
    NotAuthorized(String),
}

/// Data store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("message '{0}' not found")]
    MessageNotFound(String),

    #[error("message '{0}' already exists")]
    DuplicateMessage(String),
}

/// Failures of a single push to one connection.
///
/// Pushes are best-effort: callers log these and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// The connection's outbox is full; the event was dropped.
    #[error("outbox of session '{0}' is full")]
    OutboxFull(String),

    /// The connection's writer task is gone.
    #[error("session '{0}' is closed")]
    Closed(String),
}
