//! Bearer token claims and token response types.

use serde::{Deserialize, Serialize};

use crate::user::User;

/// Claims carried inside a signed bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id as a string.
    pub sub: String,
    pub email: String,
    pub is_active: bool,
    /// Expiry as a unix timestamp. Absent unless a token TTL is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn for_user(user: &User, exp: Option<i64>) -> Self {
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            is_active: user.is_active,
            exp,
        }
    }
}

/// Token response returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

impl AccessToken {
    pub fn bearer(token: String) -> Self {
        Self {
            access_token: token,
            token_type: "bearer".to_string(),
        }
    }
}
