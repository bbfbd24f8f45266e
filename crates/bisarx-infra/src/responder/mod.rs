//! HttpAiResponder -- concrete [`AiResponder`] backed by the hosted assistant.
//!
//! POSTs `{"session_id": "<uuid>", "message": "<text>"}` to the configured URL
//! and expects `{"reply": "...", "status": "..."}` back; both fields are
//! required. The whole request is bounded by a client-level timeout. Every failure mode maps to a
//! [`ResponderError`]; the chat service turns those into a fallback reply.

use std::time::Duration;

use bisarx_core::responder::AiResponder;
use bisarx_types::chat::AiReply;
use bisarx_types::error::ResponderError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Serialize)]
struct ResponderRequest<'a> {
    session_id: String,
    message: &'a str,
}

#[derive(Deserialize)]
struct ResponderResponse {
    reply: String,
    status: String,
}

/// AI responder reached over HTTP(S).
pub struct HttpAiResponder {
    client: reqwest::Client,
    url: String,
}

impl HttpAiResponder {
    /// Create a responder posting to `url`, giving up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ResponderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResponderError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AiResponder for HttpAiResponder {
    async fn respond(&self, session_id: &Uuid, message: &str) -> Result<AiReply, ResponderError> {
        let body = ResponderRequest {
            session_id: session_id.to_string(),
            message,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResponderError::Transport(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: ResponderResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ResponderError::Malformed(e.to_string()))?;

        debug!(session_id = %session_id, status = %parsed.status, "AI responder replied");
        Ok(AiReply {
            reply: parsed.reply,
            status: parsed.status,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ResponderError {
    if e.is_timeout() {
        ResponderError::Timeout
    } else {
        ResponderError::Transport(e.to_string())
    }
}
