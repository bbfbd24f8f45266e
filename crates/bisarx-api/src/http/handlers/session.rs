//! Session listing handler.
//!
//! Endpoints:
//! - GET /sessions/ - The caller's sessions, newest first

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use bisarx_types::chat::ChatSession;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub id: Uuid,
    pub session_title: Option<String>,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ChatSession> for SessionOut {
    fn from(s: ChatSession) -> Self {
        Self {
            id: s.id,
            session_title: s.title,
            is_closed: s.is_closed,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionOut>,
}

/// GET /sessions/ - List the current user's sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SessionsResponse>, AppError> {
    let sessions = state.chat_service.list_sessions(&user.id).await?;
    Ok(Json(SessionsResponse {
        sessions: sessions.into_iter().map(SessionOut::from).collect(),
    }))
}
