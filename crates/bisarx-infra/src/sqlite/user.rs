//! SQLite user repository implementation.

use bisarx_core::repository::user::UserRepository;
use bisarx_types::error::RepositoryError;
use bisarx_types::user::User;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain User.
struct UserRow {
    id: String,
    email: String,
    hashed_password: String,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            hashed_password: row.try_get("hashed_password")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;

        Ok(User {
            id,
            email: self.email,
            hashed_password: self.hashed_password,
            is_active: self.is_active,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_row(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<User>, RepositoryError> {
    match row {
        Some(row) => {
            let user_row =
                UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(Some(user_row.into_user()?))
        }
        None => Ok(None),
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, hashed_password, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.is_active)
        .bind(format_datetime(&user.created_at))
        .bind(format_datetime(&user.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("email '{}' already registered", user.email)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_user(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        map_row(row)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        map_row(row)
    }

    async fn set_active(&self, id: &Uuid, is_active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(format_datetime(&Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_pool;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = User::new("alice@example.com".to_string(), "$argon2id$hash".to_string());
        repo.create_user(&user).await.unwrap();

        let by_id = repo.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");
        assert_eq!(by_id.hashed_password, "$argon2id$hash");
        assert!(by_id.is_active);

        let by_email = repo
            .get_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflict() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let first = User::new("dup@example.com".to_string(), "h1".to_string());
        repo.create_user(&first).await.unwrap();

        let second = User::new("dup@example.com".to_string(), "h2".to_string());
        let err = repo.create_user(&second).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        assert!(repo.get_user(&Uuid::now_v7()).await.unwrap().is_none());
        assert!(repo.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_active() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = User::new("bob@example.com".to_string(), "h".to_string());
        repo.create_user(&user).await.unwrap();

        repo.set_active(&user.id, false).await.unwrap();
        let fetched = repo.get_user(&user.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
        assert!(fetched.updated_at >= fetched.created_at);

        let err = repo.set_active(&Uuid::now_v7(), true).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = User::new("carol@example.com".to_string(), "h".to_string());
        repo.create_user(&user).await.unwrap();

        repo.delete_user(&user.id).await.unwrap();
        assert!(repo.get_user(&user.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_user(&user.id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }
}
