//! Message feedback handler.
//!
//! Endpoints:
//! - POST /messages/{id}/feedback - Rate an AI reply (1-5, optional comment)

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bisarx_types::chat::Feedback;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackOut {
    pub id: Uuid,
    pub message_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackOut {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            message_id: f.message_id,
            rating: f.rating,
            comment: f.comment,
            created_at: f.created_at,
        }
    }
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid format.
fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// POST /messages/{id}/feedback - Record feedback on an AI message.
pub async fn submit_feedback(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FeedbackOut>), AppError> {
    let message_id = parse_uuid(&id)?;
    let Json(req) = body?;
    // Out-of-range values become 0, which the service rejects as a bad rating.
    let rating = u8::try_from(req.rating).unwrap_or(0);

    let feedback = state
        .chat_service
        .submit_feedback(&user.id, &message_id, rating, req.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(FeedbackOut::from(feedback))))
}
