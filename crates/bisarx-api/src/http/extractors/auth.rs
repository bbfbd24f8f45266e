//! Bearer token authentication extractor.
//!
//! Reads `Authorization: Bearer <token>`, verifies the token, and loads the
//! user it belongs to. Every failure is a 401.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use bisarx_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated, active user making the request.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts)?;

        match state.auth_service.current_user(token).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) => {
                tracing::warn!(reason = %e, "Rejected bearer token");
                Err(AppError::from(e))
            }
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
fn extract_bearer(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let value = value.to_str().map_err(|_| {
        AppError::Unauthorized("Invalid Authorization header encoding".to_string())
    })?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AppError::Unauthorized("Not authenticated".to_string())),
    }
}
