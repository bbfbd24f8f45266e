//! Server configuration loader for Bisarx.
//!
//! Reads `config.toml` from the data directory (`~/.bisarx/` in production)
//! and deserializes it into [`ServerConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed, then applies `BISARX_*` environment
//! overrides.

use std::io;
use std::path::{Path, PathBuf};

use bisarx_types::config::ServerConfig;
use secrecy::SecretString;

use crate::crypto::token::load_or_create_secret;

/// Overrides the data directory.
pub const ENV_DATA_DIR: &str = "BISARX_DATA_DIR";
/// Overrides `database_url`.
pub const ENV_DATABASE_URL: &str = "BISARX_DATABASE_URL";
/// Overrides `ai_url`.
pub const ENV_AI_URL: &str = "BISARX_AI_URL";
/// Overrides `jwt_secret`.
pub const ENV_JWT_SECRET: &str = "BISARX_JWT_SECRET";

/// File name of the generated token signing key inside the data directory.
pub const JWT_KEY_FILE: &str = "jwt.key";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `BISARX_DATA_DIR` environment variable
/// 2. `~/.bisarx` under the user's home directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".bisarx");
    }

    // Last resort: current directory
    PathBuf::from(".bisarx")
}

/// Load server configuration from `{data_dir}/config.toml` plus environment
/// overrides.
///
/// - If the file does not exist, starts from [`ServerConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from the default.
/// - `BISARX_DATABASE_URL`, `BISARX_AI_URL` and `BISARX_JWT_SECRET` win over the file.
pub async fn load_server_config(data_dir: &Path) -> ServerConfig {
    let config = read_config_file(data_dir).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn read_config_file(data_dir: &Path) -> ServerConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServerConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServerConfig::default();
        }
    };

    match toml::from_str::<ServerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServerConfig::default()
        }
    }
}

/// Apply environment overrides, reading variables through `lookup`.
/// Empty values are ignored.
pub fn apply_env_overrides(
    mut config: ServerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ServerConfig {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_DATABASE_URL) {
        config.database_url = Some(url);
    }
    if let Some(url) = get(ENV_AI_URL) {
        config.ai_url = url;
    }
    if let Some(secret) = get(ENV_JWT_SECRET) {
        config.jwt_secret = Some(secret);
    }
    config
}

/// The sqlx connection URL: the configured one, or a database file in the
/// data directory.
pub fn database_url(config: &ServerConfig, data_dir: &Path) -> String {
    match &config.database_url {
        Some(url) => url.clone(),
        None => format!("sqlite://{}?mode=rwc", data_dir.join("bisarx.db").display()),
    }
}

/// The token signing secret: the configured one, or the key persisted at
/// `{data_dir}/jwt.key` (generated on first use).
pub async fn resolve_jwt_secret(config: &ServerConfig, data_dir: &Path) -> io::Result<SecretString> {
    match &config.jwt_secret {
        Some(secret) => Ok(SecretString::from(secret.clone())),
        None => load_or_create_secret(&data_dir.join(JWT_KEY_FILE)).await,
    }
}
