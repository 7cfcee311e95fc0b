//! Error taxonomy for mailbox operations.

use thiserror::Error;

/// Errors surfaced by the mailbox simulator's public API.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("{resource} not found: {id}")]
    ResourceNotFound { resource: &'static str, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid raw message: {0}")]
    InvalidRaw(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, MailError>;

impl MailError {
    pub fn resource_not_found(resource: &'static str, id: impl Into<String>) -> Self {
        MailError::ResourceNotFound {
            resource,
            id: id.into(),
        }
    }
}
