//! Chat service orchestrating session lifecycle and message persistence.
//!
//! `ChatService` coordinates the `ChatRepository`, the `SessionPolicy`, and
//! the external `AiResponder` to run a chat turn:
//!
//! 1. resolve the user's active session (reuse, replace, or create)
//! 2. persist the user's message
//! 3. ask the responder for a reply (bounded by the responder's timeout)
//! 4. persist the reply, or a fallback apology if the responder failed
//!
//! Responder failures never surface as errors; storage failures do.

use bisarx_types::chat::{
    ChatMessage, ChatOutcome, ChatSession, Feedback, STATUS_ONGOING, Sender, SessionHistory,
};
use bisarx_types::error::{ChatError, RepositoryError};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::policy::{SessionDecision, SessionPolicy};
use crate::chat::repository::ChatRepository;
use crate::responder::AiResponder;

/// Reply persisted and returned when the responder cannot be reached.
pub const FALLBACK_REPLY: &str =
    "I'm unable to process your request right now. Please try again later.";

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Longest derived session title, in characters.
const MAX_TITLE_CHARS: usize = 60;

/// Orchestrates chat session lifecycle and message persistence.
///
/// Generic over `ChatRepository` and `AiResponder` to maintain clean
/// architecture (bisarx-core never depends on bisarx-infra).
pub struct ChatService<C: ChatRepository, R: AiResponder> {
    chat_repo: C,
    responder: R,
    policy: SessionPolicy,
}

impl<C: ChatRepository, R: AiResponder> ChatService<C, R> {
    /// Create a new chat service with the default 5-minute session policy.
    pub fn new(chat_repo: C, responder: R) -> Self {
        Self::with_policy(chat_repo, responder, SessionPolicy::default())
    }

    pub fn with_policy(chat_repo: C, responder: R, policy: SessionPolicy) -> Self {
        Self {
            chat_repo,
            responder,
            policy,
        }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    // --- Session lifecycle ---

    /// Return the session the user should talk in at `now`.
    ///
    /// Reuses the most recently updated open session if it is within the
    /// inactivity window; otherwise closes it (if any) and opens a new one.
    /// Not guarded against concurrent calls for the same user; a stale session
    /// closed by another call in the meantime is simply replaced.
    pub async fn resolve_session(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChatSession, ChatError> {
        let open = self.chat_repo.find_open_session(user_id).await?;
        let decision = self.policy.decide(open.as_ref(), now);
        debug!(user_id = %user_id, ?decision, "Session policy decision");

        match (decision, open) {
            (SessionDecision::Reuse, Some(session)) => Ok(session),
            (SessionDecision::Replace, Some(stale)) => {
                match self.chat_repo.close_session(&stale.id).await {
                    Ok(()) => {
                        info!(session_id = %stale.id, user_id = %user_id, "Session closed after inactivity");
                    }
                    // A concurrent turn for the same user closed it first.
                    Err(RepositoryError::NotFound) => {
                        debug!(session_id = %stale.id, "Stale session already closed");
                    }
                    Err(e) => return Err(e.into()),
                }
                self.open_session(user_id, now).await
            }
            _ => self.open_session(user_id, now).await,
        }
    }

    async fn open_session(
        &self,
        user_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChatSession, ChatError> {
        let session = self
            .chat_repo
            .create_session(&ChatSession::open(*user_id, now))
            .await?;
        info!(session_id = %session.id, user_id = %user_id, "Session opened");
        Ok(session)
    }

    /// List a user's sessions, newest first.
    pub async fn list_sessions(&self, user_id: &Uuid) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.chat_repo.list_sessions(user_id).await?)
    }

    /// Every session of the user (newest first) with its messages (oldest first).
    pub async fn history(&self, user_id: &Uuid) -> Result<Vec<SessionHistory>, ChatError> {
        let sessions = self.chat_repo.list_sessions(user_id).await?;
        let mut history = Vec::with_capacity(sessions.len());
        for session in sessions {
            let messages = self.chat_repo.get_messages(&session.id).await?;
            history.push(SessionHistory { session, messages });
        }
        Ok(history)
    }

    // --- Chat turn ---

    /// Run one chat turn for `user_id` at the current time.
    pub async fn send_message(&self, user_id: &Uuid, message: &str) -> Result<ChatOutcome, ChatError> {
        self.send_message_at(user_id, message, Utc::now()).await
    }

    /// Run one chat turn for `user_id`, treating `now` as the current time
    /// for the session policy.
    #[tracing::instrument(name = "chat_turn", skip_all, fields(user_id = %user_id))]
    pub async fn send_message_at(
        &self,
        user_id: &Uuid,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatOutcome, ChatError> {
        validate_message(message)?;

        let session = self.resolve_session(user_id, now).await?;

        // Committed before the responder call so a crash mid-call keeps it.
        let user_msg = ChatMessage::new(session.id, Sender::User, message.to_string(), false);
        self.chat_repo.save_message(&user_msg).await?;

        if session.title.is_none() {
            self.chat_repo
                .set_session_title(&session.id, &derive_title(message))
                .await?;
        }

        let (ai_text, status, is_emergency) =
            match self.responder.respond(&session.id, message).await {
                Ok(reply) => {
                    let is_emergency = reply.is_emergency();
                    (reply.reply, reply.status, is_emergency)
                }
                Err(e) => {
                    warn!(session_id = %session.id, error = %e, "AI responder failed, using fallback reply");
                    (FALLBACK_REPLY.to_string(), STATUS_ONGOING.to_string(), false)
                }
            };

        let ai_msg = ChatMessage::new(session.id, Sender::Ai, ai_text.clone(), is_emergency);
        self.chat_repo.save_message(&ai_msg).await?;

        if is_emergency {
            warn!(session_id = %session.id, message_id = %ai_msg.id, "Emergency reply recorded");
        }

        Ok(ChatOutcome {
            session_id: session.id,
            user_message: message.to_string(),
            ai_message: ai_text,
            status,
            is_emergency,
        })
    }

    // --- Feedback ---

    /// Rate an AI message in one of the user's own sessions.
    pub async fn submit_feedback(
        &self,
        user_id: &Uuid,
        message_id: &Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Feedback, ChatError> {
        if !(1..=5).contains(&rating) {
            return Err(ChatError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let message = self
            .chat_repo
            .get_message(message_id)
            .await?
            .ok_or_else(|| ChatError::NotFound("message".to_string()))?;

        // Another user's message is reported as missing, not forbidden.
        let session = self.chat_repo.get_session(&message.session_id).await?;
        if session.map(|s| s.user_id) != Some(*user_id) {
            return Err(ChatError::NotFound("message".to_string()));
        }

        if message.sender != Sender::Ai {
            return Err(ChatError::Validation(
                "feedback can only be given on AI messages".to_string(),
            ));
        }

        let feedback = Feedback {
            id: Uuid::now_v7(),
            message_id: *message_id,
            user_id: *user_id,
            rating,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            created_at: Utc::now(),
        };
        self.chat_repo.save_feedback(&feedback).await?;
        info!(message_id = %message_id, rating, "Feedback recorded");
        Ok(feedback)
    }
}

fn validate_message(message: &str) -> Result<(), ChatError> {
    if message.trim().is_empty() {
        return Err(ChatError::Validation("message must not be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::Validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Session title from the opening message: whitespace collapsed, truncated.
fn derive_title(message: &str) -> String {
    let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_TITLE_CHARS {
        return collapsed;
    }
    let mut title: String = collapsed.chars().take(MAX_TITLE_CHARS - 1).collect();
    title.push('…');
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use bisarx_types::chat::{AiReply, STATUS_EMERGENCY};
    use bisarx_types::error::{RepositoryError, ResponderError};

    // --- In-memory repository ---

    #[derive(Default)]
    struct MemoryChatRepo {
        sessions: Mutex<HashMap<Uuid, ChatSession>>,
        messages: Mutex<Vec<ChatMessage>>,
        feedback: Mutex<Vec<Feedback>>,
        /// When set, `find_open_session` closes the session it returns, as a
        /// concurrent turn for the same user would.
        close_behind_reader: AtomicBool,
    }

    impl MemoryChatRepo {
        fn session(&self, id: &Uuid) -> ChatSession {
            self.sessions.lock().unwrap()[id].clone()
        }

        fn backdate(&self, id: &Uuid, by: chrono::Duration) {
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions.get_mut(id).unwrap();
            session.updated_at = session.updated_at - by;
        }

        fn message_count(&self, session_id: &Uuid) -> usize {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id == *session_id)
                .count()
        }
    }

    impl ChatRepository for MemoryChatRepo {
        async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.id, session.clone());
            Ok(session.clone())
        }

        async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
            Ok(self.sessions.lock().unwrap().get(session_id).cloned())
        }

        async fn find_open_session(&self, user_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            let found = sessions
                .values()
                .filter(|s| s.user_id == *user_id && !s.is_closed)
                .max_by_key(|s| s.updated_at)
                .cloned();
            if let Some(open) = &found {
                if self.close_behind_reader.load(Ordering::SeqCst) {
                    sessions.get_mut(&open.id).unwrap().is_closed = true;
                }
            }
            Ok(found)
        }

        async fn close_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            match sessions.get_mut(session_id) {
                Some(s) if !s.is_closed => {
                    s.is_closed = true;
                    Ok(())
                }
                _ => Err(RepositoryError::NotFound),
            }
        }

        async fn set_session_title(&self, session_id: &Uuid, title: &str) -> Result<(), RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            let s = sessions.get_mut(session_id).ok_or(RepositoryError::NotFound)?;
            s.title = Some(title.to_string());
            Ok(())
        }

        async fn list_sessions(&self, user_id: &Uuid) -> Result<Vec<ChatSession>, RepositoryError> {
            let mut sessions: Vec<ChatSession> = self
                .sessions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.user_id == *user_id)
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(sessions)
        }

        async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            let s = sessions
                .get_mut(&message.session_id)
                .ok_or(RepositoryError::NotFound)?;
            s.updated_at = s.updated_at.max(message.created_at);
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn get_message(&self, message_id: &Uuid) -> Result<Option<ChatMessage>, RepositoryError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .find(|m| m.id == *message_id)
                .cloned())
        }

        async fn get_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
            let mut messages: Vec<ChatMessage> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id == *session_id)
                .cloned()
                .collect();
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(messages)
        }

        async fn save_feedback(&self, feedback: &Feedback) -> Result<(), RepositoryError> {
            let mut all = self.feedback.lock().unwrap();
            if all.iter().any(|f| f.message_id == feedback.message_id) {
                return Err(RepositoryError::Conflict("feedback already exists".to_string()));
            }
            all.push(feedback.clone());
            Ok(())
        }

        async fn get_feedback(&self, message_id: &Uuid) -> Result<Option<Feedback>, RepositoryError> {
            Ok(self
                .feedback
                .lock()
                .unwrap()
                .iter()
                .find(|f| f.message_id == *message_id)
                .cloned())
        }
    }

    // --- Scripted responder ---

    enum Script {
        Reply(&'static str, &'static str),
        Fail,
    }

    struct ScriptedResponder {
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedResponder {
        fn replying(reply: &'static str, status: &'static str) -> Self {
            Self {
                script: Script::Reply(reply, status),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                script: Script::Fail,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AiResponder for ScriptedResponder {
        async fn respond(&self, _session_id: &Uuid, _message: &str) -> Result<AiReply, ResponderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Reply(reply, status) => Ok(AiReply {
                    reply: reply.to_string(),
                    status: status.to_string(),
                }),
                Script::Fail => Err(ResponderError::Timeout),
            }
        }
    }

    fn service(responder: ScriptedResponder) -> ChatService<MemoryChatRepo, ScriptedResponder> {
        ChatService::new(MemoryChatRepo::default(), responder)
    }

    #[tokio::test]
    async fn test_first_message_creates_session() {
        let svc = service(ScriptedResponder::replying("Rest well.", "ongoing"));
        let user_id = Uuid::now_v7();

        let outcome = svc.send_message(&user_id, "I have a headache").await.unwrap();

        assert_eq!(outcome.user_message, "I have a headache");
        assert_eq!(outcome.ai_message, "Rest well.");
        assert_eq!(outcome.status, "ongoing");
        assert!(!outcome.is_emergency);

        let session = svc.chat_repo().session(&outcome.session_id);
        assert_eq!(session.user_id, user_id);
        assert!(!session.is_closed);
        assert_eq!(session.title.as_deref(), Some("I have a headache"));
        assert_eq!(svc.chat_repo().message_count(&outcome.session_id), 2);
    }

    #[tokio::test]
    async fn test_session_reused_within_window() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();

        let first = svc.send_message(&user_id, "one").await.unwrap();
        svc.chat_repo()
            .backdate(&first.session_id, chrono::Duration::minutes(4));
        let second = svc.send_message(&user_id, "two").await.unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(svc.chat_repo().message_count(&first.session_id), 4);
        // Title stays the one derived from the opening message.
        let session = svc.chat_repo().session(&first.session_id);
        assert_eq!(session.title.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn test_expired_session_closed_and_replaced() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();

        let first = svc.send_message(&user_id, "one").await.unwrap();
        svc.chat_repo()
            .backdate(&first.session_id, chrono::Duration::minutes(6));
        let second = svc.send_message(&user_id, "two").await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert!(svc.chat_repo().session(&first.session_id).is_closed);
        assert!(!svc.chat_repo().session(&second.session_id).is_closed);
        assert_eq!(svc.chat_repo().message_count(&first.session_id), 2);
        assert_eq!(svc.chat_repo().message_count(&second.session_id), 2);
    }

    #[tokio::test]
    async fn test_stale_session_closed_concurrently_is_still_replaced() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();

        let first = svc.send_message(&user_id, "one").await.unwrap();
        svc.chat_repo()
            .backdate(&first.session_id, chrono::Duration::minutes(6));
        svc.chat_repo().close_behind_reader.store(true, Ordering::SeqCst);

        let second = svc.send_message(&user_id, "hello").await.unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert!(svc.chat_repo().session(&first.session_id).is_closed);
        assert_eq!(svc.chat_repo().message_count(&second.session_id), 2);
        let messages = svc.chat_repo().get_messages(&second.session_id).await.unwrap();
        assert_eq!(messages[0].text, "hello");
    }

    #[tokio::test]
    async fn test_resolve_session_uses_given_clock() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();
        let start = Utc::now();

        let s1 = svc.resolve_session(&user_id, start).await.unwrap();
        let s2 = svc
            .resolve_session(&user_id, start + chrono::Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(s1.id, s2.id);

        let s3 = svc
            .resolve_session(&user_id, start + chrono::Duration::minutes(5) + chrono::Duration::seconds(1))
            .await
            .unwrap();
        assert_ne!(s1.id, s3.id);
        assert!(svc.chat_repo().session(&s1.id).is_closed);
    }

    #[tokio::test]
    async fn test_sessions_are_per_user() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let alice = Uuid::now_v7();
        let bob = Uuid::now_v7();

        let a = svc.send_message(&alice, "hi").await.unwrap();
        let b = svc.send_message(&bob, "hi").await.unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[tokio::test]
    async fn test_emergency_status_sets_flag() {
        let svc = service(ScriptedResponder::replying("Seek help now.", STATUS_EMERGENCY));
        let user_id = Uuid::now_v7();

        let outcome = svc.send_message(&user_id, "chest pain").await.unwrap();
        assert!(outcome.is_emergency);
        assert_eq!(outcome.status, "emergency");

        let messages = svc.chat_repo().get_messages(&outcome.session_id).await.unwrap();
        assert!(!messages[0].is_emergency);
        assert_eq!(messages[1].sender, Sender::Ai);
        assert!(messages[1].is_emergency);
    }

    #[tokio::test]
    async fn test_responder_failure_returns_fallback_and_keeps_user_message() {
        let svc = service(ScriptedResponder::failing());
        let user_id = Uuid::now_v7();

        let outcome = svc.send_message(&user_id, "are you there?").await.unwrap();
        assert_eq!(outcome.ai_message, FALLBACK_REPLY);
        assert_eq!(outcome.status, STATUS_ONGOING);
        assert!(!outcome.is_emergency);

        let messages = svc.chat_repo().get_messages(&outcome.session_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "are you there?");
        assert_eq!(messages[1].text, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_without_side_effects() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();

        let err = svc.send_message(&user_id, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(svc.list_sessions(&user_id).await.unwrap().is_empty());
        assert_eq!(svc.responder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_message_rejected() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        let err = svc.send_message(&Uuid::now_v7(), &long).await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_history_ordering() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();

        let first = svc.send_message(&user_id, "first session").await.unwrap();
        svc.chat_repo()
            .backdate(&first.session_id, chrono::Duration::minutes(10));
        let second = svc.send_message(&user_id, "second session").await.unwrap();

        let history = svc.history(&user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].session.id, second.session_id);
        assert_eq!(history[1].session.id, first.session_id);
        for entry in &history {
            assert_eq!(entry.messages.len(), 2);
            assert_eq!(entry.messages[0].sender, Sender::User);
            assert!(entry.messages[0].created_at <= entry.messages[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_feedback_on_ai_message() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();
        let outcome = svc.send_message(&user_id, "hello").await.unwrap();
        let messages = svc.chat_repo().get_messages(&outcome.session_id).await.unwrap();
        let ai_id = messages[1].id;

        let fb = svc
            .submit_feedback(&user_id, &ai_id, 4, Some("  helpful ".to_string()))
            .await
            .unwrap();
        assert_eq!(fb.rating, 4);
        assert_eq!(fb.comment.as_deref(), Some("helpful"));

        let dup = svc.submit_feedback(&user_id, &ai_id, 5, None).await.unwrap_err();
        assert!(matches!(dup, ChatError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_feedback_rules() {
        let svc = service(ScriptedResponder::replying("ok", "ongoing"));
        let user_id = Uuid::now_v7();
        let outcome = svc.send_message(&user_id, "hello").await.unwrap();
        let messages = svc.chat_repo().get_messages(&outcome.session_id).await.unwrap();

        let err = svc
            .submit_feedback(&user_id, &messages[1].id, 0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));

        let err = svc
            .submit_feedback(&user_id, &messages[0].id, 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));

        let stranger = Uuid::now_v7();
        let err = svc
            .submit_feedback(&stranger, &messages[1].id, 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));

        let err = svc
            .submit_feedback(&user_id, &Uuid::now_v7(), 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("  my   knee\nhurts "), "my knee hurts");
        let long = "word ".repeat(40);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.ends_with('…'));
    }
}
