//! Chat session lifecycle, message persistence, and the chat turn orchestrator.
//!
//! - `repository`: the `ChatRepository` port for sessions, messages and feedback
//! - `policy`: the inactivity-timeout session policy
//! - `service`: `ChatService`, which runs a full chat turn

pub mod policy;
pub mod repository;
pub mod service;
