//! Registration and login handlers.
//!
//! Endpoints:
//! - POST /api/register - Create an account, returns a bearer token
//! - POST /api/login    - Exchange credentials for a bearer token

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;

use bisarx_types::auth::AccessToken;

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for register and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/register - Register a new user.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AccessToken>, AppError> {
    let Json(req) = body?;
    let token = state.auth_service.register(&req.email, &req.password).await?;
    Ok(Json(token))
}

/// POST /api/login - Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AccessToken>, AppError> {
    let Json(req) = body?;
    let token = state.auth_service.login(&req.email, &req.password).await?;
    Ok(Json(token))
}
