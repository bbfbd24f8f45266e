//! Application error type mapping to HTTP status codes and the
//! `{"detail": ..., "code": ...}` error body.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use bisarx_types::error::{AuthError, ChatError};

/// Message returned for 429 responses.
pub const RATE_LIMIT_DETAIL: &str = "Rate limit exceeded. Try again later.";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Registration, login, and token errors.
    Auth(AuthError),
    /// Chat, history, and feedback errors.
    Chat(ChatError),
    /// Missing or unusable `Authorization` header.
    Unauthorized(String),
    /// Request body could not be parsed.
    InvalidBody(StatusCode, String),
    /// Validation error outside the domain services (e.g. path parameters).
    Validation(String),
    /// Too many requests from one client.
    RateLimited,
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::InvalidBody(e.status(), e.body_text())
    }
}

fn internal(detail: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Request failed with internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match &self {
            AppError::Auth(AuthError::EmailTaken) => (
                StatusCode::BAD_REQUEST,
                "EMAIL_TAKEN",
                "A user with this email already exists".to_string(),
            ),
            AppError::Auth(AuthError::RegistrationFailed) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                "Bad request: could not create user".to_string(),
            ),
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            AppError::Auth(AuthError::TokenExpired) => {
                (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", "Token expired".to_string())
            }
            AppError::Auth(AuthError::InvalidToken) => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", "Invalid token".to_string())
            }
            AppError::Auth(AuthError::UserNotFound) => {
                (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND", "User not found".to_string())
            }
            AppError::Auth(AuthError::InactiveUser) => {
                (StatusCode::UNAUTHORIZED, "INACTIVE_USER", "Inactive user".to_string())
            }
            AppError::Auth(AuthError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Auth(e @ (AuthError::Hashing | AuthError::Storage(_))) => {
                internal(&e.to_string())
            }
            AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", capitalize(what)))
            }
            AppError::Chat(ChatError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Chat(e @ ChatError::Storage(_)) => internal(&e.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::InvalidBody(status, msg) => (*status, "INVALID_BODY", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                RATE_LIMIT_DETAIL.to_string(),
            ),
        };

        let body = json!({
            "detail": detail,
            "code": code,
        });

        let mut response = (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
