use thiserror::Error;

/// Errors from repository operations (used by trait definitions in bisarx-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to registration, login, and token resolution.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a user with this email already exists")]
    EmailTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error("user not found")]
    UserNotFound,

    #[error("inactive user")]
    InactiveUser,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("password hashing failed")]
    Hashing,

    #[error("could not create user")]
    RegistrationFailed,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to chat sessions, messages, and feedback.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound("entity".to_string()),
            RepositoryError::Conflict(msg) => ChatError::Conflict(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

/// Errors from the external AI responder.
///
/// These never reach HTTP clients; the chat orchestrator converts them into
/// a fallback reply.
#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("responder request failed: {0}")]
    Transport(String),

    #[error("responder timed out")]
    Timeout,

    #[error("malformed responder payload: {0}")]
    Malformed(String),
}
