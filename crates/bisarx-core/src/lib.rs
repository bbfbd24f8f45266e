//! Business logic and repository trait definitions for Bisarx.
//!
//! This crate defines the "ports" (repository, hashing, token and responder
//! traits) that the infrastructure layer implements. It depends only on
//! `bisarx-types` -- never on `bisarx-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod repository;
pub mod responder;
