//! HS256 bearer tokens (compact JWS) and signing-key management.
//!
//! Token layout is the standard three-part `header.payload.signature`, each
//! part base64url without padding. The header is always
//! `{"alg":"HS256","typ":"JWT"}`; tokens announcing any other algorithm are
//! rejected before the signature is checked.
//!
//! SECURITY: the signing key is held in a `SecretString` and never logged.

use std::io;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bisarx_core::auth::token::TokenCodec;
use bisarx_types::auth::Claims;
use bisarx_types::error::AuthError;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::info;

use super::{hex_decode, hex_encode};

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Length of a generated signing key, in bytes.
const GENERATED_KEY_LEN: usize = 32;

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// HMAC-SHA256 implementation of `TokenCodec`.
pub struct Hs256TokenCodec {
    secret: SecretString,
}

impl Hs256TokenCodec {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Decode `token`, treating `now` (unix seconds) as the current time.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let header: Header = decode_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(AuthError::InvalidToken);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| AuthError::InvalidToken)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        // Constant-time verification (via hmac crate's `verify_slice`)
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let claims: Claims = decode_json(payload_b64)?;
        match claims.exp {
            Some(exp) if now >= exp => Err(AuthError::TokenExpired),
            _ => Ok(claims),
        }
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|_| AuthError::InvalidToken)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_json<T: for<'de> Deserialize<'de>>(part: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

impl TokenCodec for Hs256TokenCodec {
    fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        let signing_input = format!("{}.{}", encode_json(&Header::hs256())?, encode_json(claims)?);
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_at(token, Utc::now().timestamp())
    }
}

/// Read the signing key from `path`, generating and persisting a random one
/// if the file does not exist yet.
///
/// The key file holds the key as lowercase hex. On Unix it is created with
/// mode 0600.
pub async fn load_or_create_secret(path: &Path) -> io::Result<SecretString> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let key = content.trim();
            if key.is_empty() || hex_decode(key).is_err() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("signing key file {} is not valid hex", path.display()),
                ));
            }
            Ok(SecretString::from(key.to_string()))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            use argon2::password_hash::rand_core::{OsRng, RngCore};

            let mut bytes = [0u8; GENERATED_KEY_LEN];
            OsRng.fill_bytes(&mut bytes);
            let key = hex_encode(&bytes);

            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, &key).await?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
            }
            info!(path = %path.display(), "Generated new token signing key");
            Ok(SecretString::from(key))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bisarx_types::user::User;

    fn codec(secret: &str) -> Hs256TokenCodec {
        Hs256TokenCodec::new(SecretString::from(secret.to_string()))
    }

    fn claims(exp: Option<i64>) -> Claims {
        let user = User::new("pat@example.com".to_string(), "h".to_string());
        Claims::for_user(&user, exp)
    }

    #[test]
    fn test_encode_decode() {
        let codec = codec("test-secret");
        let original = claims(None);
        let token = codec.encode(&original).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_header_is_standard_hs256() {
        let token = codec("k").encode(&claims(None)).unwrap();
        let header_b64 = token.split('.').next().unwrap();
        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header_b64).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS256");
        assert_eq!(header["typ"], "JWT");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = codec("secret-a").encode(&claims(None)).unwrap();
        let err = codec("secret-b").decode(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec("test-secret");
        let token = codec.encode(&claims(None)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = claims(None);
        forged.email = "admin@example.com".to_string();
        let forged_payload = encode_json(&forged).unwrap();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            codec.decode(&tampered).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn test_alg_none_rejected() {
        let codec = codec("test-secret");
        let header = encode_json(&Header {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })
        .unwrap();
        let payload = encode_json(&claims(None)).unwrap();
        let token = format!("{header}.{payload}.");
        assert!(matches!(
            codec.decode(&token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = codec("test-secret");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!!.@@@.###"] {
            assert!(
                matches!(codec.decode(token).unwrap_err(), AuthError::InvalidToken),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn test_expiry() {
        let codec = codec("test-secret");
        let token = codec.encode(&claims(Some(1_000))).unwrap();

        assert!(codec.decode_at(&token, 999).is_ok());
        assert!(matches!(
            codec.decode_at(&token, 1_000).unwrap_err(),
            AuthError::TokenExpired
        ));
    }

    #[test]
    fn test_expired_but_forged_is_invalid_not_expired() {
        let token = codec("secret-a").encode(&claims(Some(1))).unwrap();
        assert!(matches!(
            codec("secret-b").decode(&token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[tokio::test]
    async fn test_load_or_create_secret_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("jwt.key");

        let first = load_or_create_secret(&path).await.unwrap();
        assert_eq!(first.expose_secret().len(), GENERATED_KEY_LEN * 2);

        let second = load_or_create_secret(&path).await.unwrap();
        assert_eq!(first.expose_secret(), second.expose_secret());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_load_secret_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwt.key");
        tokio::fs::write(&path, "not hex at all").await.unwrap();

        let err = load_or_create_secret(&path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
