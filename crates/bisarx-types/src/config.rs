//! Server configuration types for Bisarx.
//!
//! `ServerConfig` represents the `config.toml` in the data directory that
//! controls the listen address, database location, AI responder endpoint,
//! session timeout, and rate limits.

use serde::{Deserialize, Serialize};

/// Default hosted assistant endpoint.
pub const DEFAULT_AI_URL: &str = "https://bisarx-assistant-1031993103540.us-central1.run.app/chat";

/// Top-level configuration for the Bisarx service.
///
/// Loaded from `~/.bisarx/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// sqlx connection URL. Derived from the data directory when absent.
    #[serde(default)]
    pub database_url: Option<String>,

    /// HTTPS endpoint of the AI responder.
    #[serde(default = "default_ai_url")]
    pub ai_url: String,

    /// Hard timeout for a single responder call.
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,

    /// Inactivity window after which an open session is closed.
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,

    /// Token lifetime. `None` issues tokens without an `exp` claim.
    #[serde(default)]
    pub token_ttl_secs: Option<u64>,

    /// HMAC signing secret for bearer tokens. Generated into the data
    /// directory when absent.
    #[serde(default, skip_serializing)]
    pub jwt_secret: Option<String>,

    #[serde(default)]
    pub chat_rate_limit: RateLimitConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_ai_url() -> String {
    DEFAULT_AI_URL.to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_session_timeout_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            ai_url: default_ai_url(),
            ai_timeout_secs: default_ai_timeout_secs(),
            session_timeout_secs: default_session_timeout_secs(),
            token_ttl_secs: None,
            jwt_secret: None,
            chat_rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Sliding-window request limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.ai_timeout_secs, 30);
        assert_eq!(config.session_timeout_secs, 300);
        assert!(config.token_ttl_secs.is_none());
        assert_eq!(config.chat_rate_limit.max_requests, 5);
        assert_eq!(config.chat_rate_limit.window_secs, 60);
    }

    #[test]
    fn test_server_config_deserialize_with_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.ai_url, DEFAULT_AI_URL);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_server_config_deserialize_with_values() {
        let toml_str = r#"
port = 9000
ai_url = "http://localhost:7000/chat"
ai_timeout_secs = 5
token_ttl_secs = 3600
jwt_secret = "s3cret"

[chat_rate_limit]
max_requests = 10
"#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.ai_url, "http://localhost:7000/chat");
        assert_eq!(config.ai_timeout_secs, 5);
        assert_eq!(config.token_ttl_secs, Some(3600));
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.chat_rate_limit.max_requests, 10);
        assert_eq!(config.chat_rate_limit.window_secs, 60);
    }

    #[test]
    fn test_jwt_secret_not_serialized() {
        let config = ServerConfig {
            jwt_secret: Some("s3cret".to_string()),
            ..ServerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("s3cret"));
    }
}
