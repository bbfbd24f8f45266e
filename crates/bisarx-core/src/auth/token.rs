//! TokenCodec trait for signed bearer tokens.

use bisarx_types::auth::Claims;
use bisarx_types::error::AuthError;

/// Signs claims into an opaque bearer token and verifies them back.
pub trait TokenCodec: Send + Sync {
    /// Produce a signed token carrying `claims`.
    fn encode(&self, claims: &Claims) -> Result<String, AuthError>;

    /// Verify the signature and, when an `exp` claim is present, the expiry.
    ///
    /// Returns `AuthError::TokenExpired` for a valid but expired token and
    /// `AuthError::InvalidToken` for anything malformed or mis-signed.
    fn decode(&self, token: &str) -> Result<Claims, AuthError>;
}
