//! ChatRepository trait definition.
//!
//! Provides persistence for chat sessions, messages, and message feedback.
//! Follows the same RPITIT pattern as UserRepository.

use bisarx_types::chat::{ChatMessage, ChatSession, Feedback};
use bisarx_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in bisarx-infra (e.g., `SqliteChatRepository`).
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// The user's open session with the most recent `updated_at`, if any.
    fn find_open_session(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Mark an open session as closed.
    ///
    /// Only matches open rows; closing an already closed or missing session
    /// returns `RepositoryError::NotFound`. There is no inverse operation.
    fn close_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Set the display title of a session.
    fn set_session_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List a user's sessions, ordered by created_at DESC.
    fn list_sessions(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Append a message and advance the owning session's `updated_at` to the
    /// message's `created_at`, atomically. `updated_at` never moves backwards.
    ///
    /// Returns `RepositoryError::NotFound` if the session does not exist.
    fn save_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a single message by id.
    fn get_message(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatMessage>, RepositoryError>> + Send;

    /// Get messages for a session, ordered by created_at ASC.
    fn get_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Record feedback for a message. Returns `RepositoryError::Conflict` if
    /// the message already has feedback.
    fn save_feedback(
        &self,
        feedback: &Feedback,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the feedback attached to a message, if any.
    fn get_feedback(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Feedback>, RepositoryError>> + Send;
}
