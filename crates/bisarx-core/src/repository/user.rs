//! UserRepository trait definition.

use bisarx_types::error::RepositoryError;
use bisarx_types::user::User;
use uuid::Uuid;

/// Repository trait for user account persistence.
///
/// Implementations live in bisarx-infra (e.g., `SqliteUserRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Returns `RepositoryError::Conflict` when the email
    /// is already registered.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by id.
    fn get_user(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by (normalized) email.
    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Activate or deactivate a user.
    fn set_active(
        &self,
        id: &Uuid,
        is_active: bool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a user together with their sessions, messages and feedback.
    fn delete_user(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
