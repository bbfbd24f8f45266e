//! Chat handlers.
//!
//! Endpoints:
//! - POST /chat         - Send a message, get the AI reply (rate-limited)
//! - GET  /chat/history - All sessions of the caller with their messages

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bisarx_types::chat::{ChatMessage, ChatOutcome, Sender, SessionHistory};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// One message in a history entry.
#[derive(Debug, Serialize)]
pub struct MessageOut {
    pub id: Uuid,
    pub sender: Sender,
    pub message_text: String,
    pub is_emergency: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageOut {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            sender: m.sender,
            message_text: m.text,
            is_emergency: m.is_emergency,
            created_at: m.created_at,
        }
    }
}

/// One session in the history response.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageOut>,
}

impl From<SessionHistory> for HistoryEntry {
    fn from(h: SessionHistory) -> Self {
        Self {
            session_id: h.session.id,
            created_at: h.session.created_at,
            messages: h.messages.into_iter().map(MessageOut::from).collect(),
        }
    }
}

/// POST /chat - Run one chat turn for the current user.
pub async fn send_chat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatOutcome>, AppError> {
    let Json(req) = body?;
    let outcome = state.chat_service.send_message(&user.id, &req.message).await?;
    Ok(Json(outcome))
}

/// GET /chat/history - Sessions newest first, messages oldest first.
pub async fn chat_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let history = state.chat_service.history(&user.id).await?;
    Ok(Json(history.into_iter().map(HistoryEntry::from).collect()))
}
