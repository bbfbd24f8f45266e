//! Shared domain types for Bisarx.
//!
//! This crate contains the core domain types used across the Bisarx service:
//! User, ChatSession, ChatMessage, Feedback, token claims, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod user;
