//! HTTP/REST API layer for Bisarx.
//!
//! Axum-based REST API with bearer-token authentication, flat JSON bodies,
//! a rate-limited chat endpoint, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod rate_limit;
pub mod router;
