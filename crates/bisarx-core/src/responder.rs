//! External AI responder port.
//!
//! `AiResponder` is the contract with the remote assistant: send the user's
//! message tagged with the session id, get back `{reply, status}`. The
//! concrete HTTP client lives in `bisarx-infra`.
//!
//! `BoxAiResponder` follows the blanket-impl pattern for RPITIT traits:
//! 1. An object-safe `AiResponderDyn` trait with boxed futures
//! 2. A blanket impl of `AiResponderDyn` for all `T: AiResponder`
//! 3. `BoxAiResponder` wraps `Box<dyn AiResponderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use bisarx_types::chat::AiReply;
use bisarx_types::error::ResponderError;
use uuid::Uuid;

/// A remote service that answers user messages.
pub trait AiResponder: Send + Sync {
    /// Ask the responder for a reply to `message` within `session_id`.
    fn respond(
        &self,
        session_id: &Uuid,
        message: &str,
    ) -> impl Future<Output = Result<AiReply, ResponderError>> + Send;
}

/// Object-safe version of [`AiResponder`] with boxed futures.
pub trait AiResponderDyn: Send + Sync {
    fn respond_boxed<'a>(
        &'a self,
        session_id: &'a Uuid,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AiReply, ResponderError>> + Send + 'a>>;
}

impl<T: AiResponder> AiResponderDyn for T {
    fn respond_boxed<'a>(
        &'a self,
        session_id: &'a Uuid,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<AiReply, ResponderError>> + Send + 'a>> {
        Box::pin(self.respond(session_id, message))
    }
}

/// Type-erased responder, so application state can hold either the HTTP
/// client or a test double behind one concrete type.
pub struct BoxAiResponder {
    inner: Box<dyn AiResponderDyn + Send + Sync>,
}

impl BoxAiResponder {
    pub fn new<T: AiResponder + 'static>(responder: T) -> Self {
        Self {
            inner: Box::new(responder),
        }
    }
}

impl AiResponder for BoxAiResponder {
    async fn respond(&self, session_id: &Uuid, message: &str) -> Result<AiReply, ResponderError> {
        self.inner.respond_boxed(session_id, message).await
    }
}
