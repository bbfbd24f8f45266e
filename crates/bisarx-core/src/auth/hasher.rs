//! CredentialHasher trait for password storage.
//!
//! Defined in bisarx-core so services can hash and verify passwords without
//! coupling to a specific algorithm. The `Argon2CredentialHasher` adapter
//! lives in bisarx-infra.

use bisarx_types::error::AuthError;

/// Abstraction over one-way password hashing.
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password into a self-describing string (salt included).
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored hash.
    ///
    /// A malformed stored hash verifies as `false`.
    fn verify(&self, password: &str, hashed: &str) -> bool;
}
