use thiserror::Error;

/// Errors surfaced by the messaging module.
///
/// Persistence failures keep the underlying message; they are never swallowed.
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Broadcast resolved to zero recipients")]
    EmptyRecipients,

    #[error("Invalid participants: {0}")]
    InvalidParticipants(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, MessagingError>;
