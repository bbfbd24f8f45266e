//! Infrastructure layer for Bisarx.
//!
//! Contains implementations of the ports defined in `bisarx-core`: SQLite
//! storage, argon2 password hashing, HS256 bearer tokens, the HTTP client
//! for the external AI responder, and configuration loading.

pub mod config;
pub mod crypto;
pub mod responder;
pub mod sqlite;
