//! HTTP request handlers for the REST API.

pub mod auth;
pub mod chat;
pub mod feedback;
pub mod session;
