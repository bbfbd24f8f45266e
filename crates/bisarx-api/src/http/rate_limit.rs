//! Per-client sliding-window rate limiting for the chat endpoint.
//!
//! Each client IP keeps the instants of its recent requests. A request is
//! admitted while fewer than `max_requests` fall inside the trailing window.
//! State is process-local and lost on restart.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use bisarx_types::config::RateLimitConfig;

use crate::http::error::AppError;
use crate::state::AppState;

/// Key used when the peer address is unavailable.
const UNKNOWN_CLIENT: &str = "unknown";

/// Tracked clients above which idle entries are swept.
const SWEEP_THRESHOLD: usize = 10_000;

/// Sliding-window limiter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    /// A configured limit of zero is raised to one request per window.
    pub fn new(config: RateLimitConfig) -> Self {
        if config.max_requests == 0 {
            tracing::warn!("chat_rate_limit.max_requests is 0, using 1");
        }
        Self {
            max_requests: usize::try_from(config.max_requests.max(1)).unwrap_or(usize::MAX),
            window: Duration::from_secs(config.window_secs),
            hits: DashMap::new(),
        }
    }

    /// Record a request from `key` and report whether it is within the limit.
    /// Rejected requests are not recorded.
    pub fn check_and_record(&self, key: &str) -> bool {
        self.check_and_record_at(key, Instant::now())
    }

    fn check_and_record_at(&self, key: &str, now: Instant) -> bool {
        if self.hits.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut hits = self.hits.entry(key.to_string()).or_default();
        hits.retain(|t| now.saturating_duration_since(*t) < self.window);
        if hits.len() >= self.max_requests {
            return false;
        }
        hits.push(now);
        true
    }

    fn sweep(&self, now: Instant) {
        self.hits.retain(|_, hits| {
            hits.retain(|t| now.saturating_duration_since(*t) < self.window);
            !hits.is_empty()
        });
    }
}

/// Middleware rejecting requests over the chat rate limit with 429.
pub async fn limit_chat(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    if !state.chat_limiter.check_and_record(&client) {
        tracing::warn!(client = %client, "Chat rate limit exceeded");
        return AppError::RateLimited.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[test]
    fn test_admits_up_to_limit() {
        let limiter = limiter(5, 60);
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.check_and_record_at("1.2.3.4", now));
        }
        assert!(!limiter.check_and_record_at("1.2.3.4", now));
    }

    #[test]
    fn test_zero_limit_still_admits_one() {
        let limiter = limiter(0, 60);
        let now = Instant::now();
        assert!(limiter.check_and_record_at("a", now));
        assert!(!limiter.check_and_record_at("a", now));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(limiter.check_and_record_at("a", now));
        assert!(!limiter.check_and_record_at("a", now));
        assert!(limiter.check_and_record_at("b", now));
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, 60);
        let start = Instant::now();
        assert!(limiter.check_and_record_at("a", start));
        assert!(limiter.check_and_record_at("a", start + Duration::from_secs(30)));
        assert!(!limiter.check_and_record_at("a", start + Duration::from_secs(59)));
        // The first hit has left the window.
        assert!(limiter.check_and_record_at("a", start + Duration::from_secs(60)));
        assert!(!limiter.check_and_record_at("a", start + Duration::from_secs(61)));
    }

    #[test]
    fn test_rejected_requests_not_recorded() {
        let limiter = limiter(1, 60);
        let start = Instant::now();
        assert!(limiter.check_and_record_at("a", start));
        for s in 1..50 {
            assert!(!limiter.check_and_record_at("a", start + Duration::from_secs(s)));
        }
        assert!(limiter.check_and_record_at("a", start + Duration::from_secs(60)));
    }

    #[test]
    fn test_sweep_drops_idle_clients() {
        let limiter = limiter(5, 60);
        let start = Instant::now();
        limiter.check_and_record_at("old", start);
        limiter.sweep(start + Duration::from_secs(120));
        assert!(limiter.hits.is_empty());
    }
}
