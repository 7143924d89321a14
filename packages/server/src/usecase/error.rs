//! UseCase layer errors.

use thiserror::Error;

use crate::domain::{DomainError, RepositoryError, ValueObjectError};

/// Errors raised while creating a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("receiverId is required")]
    ReceiverRequired,

    #[error("invalid receiverId: {0}")]
    InvalidReceiverId(ValueObjectError),

    #[error("message needs text or an image")]
    ContentRequired,

    #[error("invalid message content: {0}")]
    InvalidContent(ValueObjectError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors raised by `PUT /messages/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateMessageError {
    #[error("action is required")]
    ActionRequired,

    #[error("unknown action '{0}'")]
    InvalidAction(String),

    #[error("invalid id: {0}")]
    InvalidId(ValueObjectError),

    #[error("text is required")]
    TextRequired,

    #[error("invalid message content: {0}")]
    InvalidContent(ValueObjectError),

    #[error("message '{0}' not found")]
    MessageNotFound(String),

    #[error("user '{0}' may not edit this message")]
    NotAuthorized(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for UpdateMessageError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::MessageNotFound(id) => Self::MessageNotFound(id),
            other => Self::Repository(other),
        }
    }
}

impl From<DomainError> for UpdateMessageError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotAuthorized(user) => Self::NotAuthorized(user),
            DomainError::EmptyContent => Self::TextRequired,
        }
    }
}

/// Errors raised by read-side use cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid id: {0}")]
    InvalidId(ValueObjectError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
