//! Registration, login, and bearer-token resolution.
//!
//! `AuthService` is generic over the user repository, the password hasher,
//! and the token codec; the concrete argon2 and HS256 adapters live in
//! bisarx-infra.

pub mod hasher;
pub mod service;
pub mod token;
