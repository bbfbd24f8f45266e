//! Auth service: registration, login, token issuance, current-user resolution.

use std::time::Duration;

use bisarx_types::auth::{AccessToken, Claims};
use bisarx_types::error::{AuthError, RepositoryError};
use bisarx_types::user::{User, normalize_email};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::hasher::CredentialHasher;
use crate::auth::token::TokenCodec;
use crate::repository::user::UserRepository;

/// Shortest accepted password at registration.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Longest accepted password at registration.
pub const MAX_PASSWORD_CHARS: usize = 128;

const MAX_EMAIL_CHARS: usize = 255;

/// Orchestrates user accounts and bearer tokens.
pub struct AuthService<U: UserRepository, H: CredentialHasher, T: TokenCodec> {
    user_repo: U,
    hasher: H,
    codec: T,
    token_ttl: Option<Duration>,
}

impl<U: UserRepository, H: CredentialHasher, T: TokenCodec> AuthService<U, H, T> {
    /// Create an auth service issuing tokens without expiry.
    pub fn new(user_repo: U, hasher: H, codec: T) -> Self {
        Self {
            user_repo,
            hasher,
            codec,
            token_ttl: None,
        }
    }

    /// Issue tokens carrying an `exp` claim `ttl` after issuance.
    pub fn with_token_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Access the user repository.
    pub fn user_repo(&self) -> &U {
        &self.user_repo
    }

    /// Register a new account and return a token for it.
    ///
    /// Rejects an email that is already registered. A storage failure while
    /// inserting surfaces as `RegistrationFailed`.
    pub async fn register(&self, email: &str, password: &str) -> Result<AccessToken, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        if self
            .user_repo
            .get_user_by_email(&email)
            .await
            .map_err(storage)?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        let hashed = self.hasher.hash(password)?;
        let user = match self.user_repo.create_user(&User::new(email, hashed)).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration of the same email.
            Err(RepositoryError::Conflict(_)) => return Err(AuthError::EmailTaken),
            Err(e) => {
                warn!(error = %e, "Failed to store new user");
                return Err(AuthError::RegistrationFailed);
            }
        };

        info!(user_id = %user.id, "User registered");
        self.issue_token(&user)
    }

    /// Verify credentials and return a token.
    ///
    /// Unknown email, wrong password and deactivated account all yield the
    /// same `InvalidCredentials` error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .user_repo
            .get_user_by_email(&email)
            .await
            .map_err(storage)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.hashed_password) || !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        self.issue_token(&user)
    }

    /// Sign a token for `user`.
    pub fn issue_token(&self, user: &User) -> Result<AccessToken, AuthError> {
        let exp = self.token_ttl.and_then(|ttl| {
            chrono::Duration::from_std(ttl)
                .ok()
                .map(|ttl| (Utc::now() + ttl).timestamp())
        });
        let token = self.codec.encode(&Claims::for_user(user, exp))?;
        Ok(AccessToken::bearer(token))
    }

    /// Resolve the user a bearer token belongs to.
    ///
    /// The token's claims are only trusted for the user id; the active flag
    /// is read from storage so deactivation takes effect immediately.
    pub async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.codec.decode(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .user_repo
            .get_user(&user_id)
            .await
            .map_err(storage)?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }
        Ok(user)
    }

    /// Activate or deactivate the account registered under `email`.
    pub async fn set_active(&self, email: &str, is_active: bool) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let mut user = self
            .user_repo
            .get_user_by_email(&email)
            .await
            .map_err(storage)?
            .ok_or(AuthError::UserNotFound)?;

        self.user_repo
            .set_active(&user.id, is_active)
            .await
            .map_err(storage)?;
        user.is_active = is_active;
        info!(user_id = %user.id, is_active, "User activation changed");
        Ok(user)
    }
}

fn storage(e: RepositoryError) -> AuthError {
    AuthError::Storage(e.to_string())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    if email.is_empty() || email.chars().count() > MAX_EMAIL_CHARS {
        return Err(AuthError::Validation("email must be 1-255 characters".to_string()));
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AuthError::Validation("email must contain a single '@'".to_string()));
    };
    let domain_ok = domain
        .split('.')
        .filter(|label| !label.is_empty())
        .count()
        >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(AuthError::Validation("email is not a valid address".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&len) {
        return Err(AuthError::Validation(format!(
            "password must be {MIN_PASSWORD_CHARS}-{MAX_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}
