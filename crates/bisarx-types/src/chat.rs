//! Chat session, message, and feedback types for Bisarx.
//!
//! These types model conversations between a user and the AI responder:
//! sessions, the messages inside them, per-message feedback, and the
//! structured result returned by a chat turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Status tag the responder uses for urgent replies.
pub const STATUS_EMERGENCY: &str = "emergency";

/// Status tag for a normal, continuing conversation.
pub const STATUS_ONGOING: &str = "ongoing";

/// Who authored a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (sender IN ('user', 'ai'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Ai => write!(f, "ai"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "ai" => Ok(Sender::Ai),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// A bounded span of conversation between a user and the AI.
///
/// Open sessions are closed by the inactivity policy and never reopened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    /// Last activity; advances whenever a message is appended.
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// A new open session for `user_id`, stamped at `now`.
    pub fn open(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            title: None,
            is_closed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single message within a chat session.
///
/// Messages are ordered by `created_at` within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub is_emergency: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(session_id: Uuid, sender: Sender, text: String, is_emergency: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            sender,
            text,
            is_emergency,
            created_at: Utc::now(),
        }
    }
}

/// A user's rating of one AI message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub message_id: Uuid,
    pub user_id: Uuid,
    /// 1 (poor) to 5 (excellent).
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Reply payload produced by the external AI responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiReply {
    pub reply: String,
    pub status: String,
}

impl AiReply {
    pub fn is_emergency(&self) -> bool {
        self.status == STATUS_EMERGENCY
    }
}

/// Result of one chat turn, as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub session_id: Uuid,
    pub user_message: String,
    pub ai_message: String,
    pub status: String,
    pub is_emergency: bool,
}

/// A session together with its messages in ascending creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}
