//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/hasher/codec/responder traits, but
//! AppState pins them to the concrete infra implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use bisarx_core::auth::service::AuthService;
use bisarx_core::chat::policy::SessionPolicy;
use bisarx_core::chat::service::ChatService;
use bisarx_core::responder::BoxAiResponder;
use bisarx_infra::config::{database_url, resolve_jwt_secret};
use bisarx_infra::crypto::password::Argon2CredentialHasher;
use bisarx_infra::crypto::token::Hs256TokenCodec;
use bisarx_infra::responder::HttpAiResponder;
use bisarx_infra::sqlite::chat::SqliteChatRepository;
use bisarx_infra::sqlite::pool::DatabasePool;
use bisarx_infra::sqlite::user::SqliteUserRepository;
use bisarx_types::config::ServerConfig;

use crate::http::rate_limit::RateLimiter;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteAuthService =
    AuthService<SqliteUserRepository, Argon2CredentialHasher, Hs256TokenCodec>;

pub type ConcreteChatService = ChatService<SqliteChatRepository, BoxAiResponder>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<ConcreteAuthService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub chat_limiter: Arc<RateLimiter>,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: connect to DB, load the signing
    /// key, build the responder client, wire services.
    pub async fn init(data_dir: &Path, config: &ServerConfig) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let db_pool = DatabasePool::new(&database_url(config, data_dir)).await?;
        let secret = resolve_jwt_secret(config, data_dir).await?;
        let responder = HttpAiResponder::new(
            config.ai_url.clone(),
            Duration::from_secs(config.ai_timeout_secs),
        )?;

        tracing::debug!(ai_url = %responder.url(), "AI responder configured");
        Ok(Self::from_parts(
            db_pool,
            secret,
            BoxAiResponder::new(responder),
            config,
        ))
    }

    /// Wire services from already-constructed infrastructure.
    pub fn from_parts(
        db_pool: DatabasePool,
        secret: SecretString,
        responder: BoxAiResponder,
        config: &ServerConfig,
    ) -> Self {
        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            Argon2CredentialHasher::new(),
            Hs256TokenCodec::new(secret),
        )
        .with_token_ttl(config.token_ttl_secs.map(Duration::from_secs));

        let chat_service = ChatService::with_policy(
            SqliteChatRepository::new(db_pool.clone()),
            responder,
            SessionPolicy::new(Duration::from_secs(config.session_timeout_secs)),
        );

        Self {
            auth_service: Arc::new(auth_service),
            chat_service: Arc::new(chat_service),
            chat_limiter: Arc::new(RateLimiter::new(config.chat_rate_limit)),
            db_pool,
        }
    }
}
