//! Inactivity-timeout session policy.
//!
//! A user has at most one session they are actively talking in. When a new
//! message arrives the policy looks at the user's most recently updated open
//! session and decides whether it is still fresh enough to reuse:
//!
//! | Open session        | Decision  |
//! |---------------------|-----------|
//! | none                | `Create`  |
//! | idle <= timeout     | `Reuse`   |
//! | idle > timeout      | `Replace` |

use std::time::Duration;

use bisarx_types::chat::ChatSession;
use chrono::{DateTime, Utc};

/// Default inactivity window (5 minutes).
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// What to do with the user's current open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionDecision {
    /// The open session is fresh; keep using it.
    Reuse,
    /// The open session is stale; close it and start a new one.
    Replace,
    /// There is no open session; start one.
    Create,
}

/// Decides session reuse based on a fixed inactivity timeout.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    timeout: chrono::Duration,
}

impl SessionPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX),
        }
    }

    pub fn timeout(&self) -> chrono::Duration {
        self.timeout
    }

    /// Whether `session` has been idle longer than the timeout at `now`.
    ///
    /// A session idle for exactly the timeout is still fresh.
    pub fn is_expired(&self, session: &ChatSession, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.updated_at) > self.timeout
    }

    pub fn decide(&self, open: Option<&ChatSession>, now: DateTime<Utc>) -> SessionDecision {
        match open {
            None => SessionDecision::Create,
            Some(session) if self.is_expired(session, now) => SessionDecision::Replace,
            Some(_) => SessionDecision::Reuse,
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::new(SESSION_TIMEOUT)
    }
}
