//! Argon2id password hashing.
//!
//! Implements the `CredentialHasher` trait from `bisarx-core`. Hashes are PHC
//! strings (`$argon2id$v=19$...`) carrying their own salt and parameters, so
//! verification needs nothing but the stored string.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use bisarx_core::auth::hasher::CredentialHasher;
use bisarx_types::error::AuthError;

/// Argon2id implementation of `CredentialHasher` with the crate's default
/// parameters.
#[derive(Default)]
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
}

impl Argon2CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::Hashing)
    }

    fn verify(&self, password: &str, hashed: &str) -> bool {
        match PasswordHash::new(hashed) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
