// src/services/rate_limit.rs
//! Fixed-window request limiter for the AI-backed endpoints.
//!
//! Every extraction, review, mentor, and interview call fans out to the LLM
//! provider, so these routes get a tighter per-user budget than plain CRUD.

use std::collections::HashMap;
use std::env;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests per window for ordinary API routes.
    pub general_limit: u32,
    /// Requests per window for AI-backed routes.
    pub ai_limit: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_limit: 120,
            ai_limit: 20,
            window_seconds: 3600,
        }
    }
}

impl RateLimitConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(enabled) = env::var("RATE_LIMIT_ENABLED") {
            config.enabled = enabled.to_lowercase() != "false";
        }

        if let Ok(limit) = env::var("RATE_LIMIT_GENERAL") {
            if let Ok(val) = limit.parse::<u32>() {
                config.general_limit = val;
            }
        }

        if let Ok(limit) = env::var("AI_CALLS_PER_HOUR") {
            if let Ok(val) = limit.parse::<u32>() {
                config.ai_limit = val;
            }
        }

        if let Ok(window) = env::var("RATE_LIMIT_WINDOW_SECONDS") {
            if let Ok(val) = window.parse::<u64>() {
                config.window_seconds = val;
            }
        }

        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited { retry_after: u32 },
}

#[derive(Debug)]
struct WindowState {
    window_start: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimitService {
    config: RateLimitConfig,
    windows: RwLock<HashMap<String, WindowState>>,
}

impl RateLimitService {
    pub fn new() -> Self {
        Self {
            config: RateLimitConfig::from_env(),
            windows: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Check and record one request for the identifier. AI routes and
    /// general routes count in separate windows.
    pub async fn check_rate_limit(&self, identifier: &str, is_ai_route: bool) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::Allowed;
        }

        let limit = if is_ai_route {
            self.config.ai_limit
        } else {
            self.config.general_limit
        };
        let window = Duration::from_secs(self.config.window_seconds);
        let key = if is_ai_route {
            format!("ai:{}", identifier)
        } else {
            format!("api:{}", identifier)
        };

        let mut windows = self.windows.write().await;
        let now = Instant::now();

        let state = windows.entry(key.clone()).or_insert(WindowState {
            window_start: now,
            count: 0,
        });

        if now.duration_since(state.window_start) >= window {
            state.window_start = now;
            state.count = 0;
        }

        if state.count >= limit {
            let elapsed = now.duration_since(state.window_start);
            let retry_after = window.saturating_sub(elapsed).as_secs() as u32;
            warn!(
                identifier = %identifier,
                ai_route = is_ai_route,
                limit = limit,
                "Rate limit exceeded"
            );
            return RateLimitResult::Limited { retry_after };
        }

        state.count += 1;
        debug!(
            identifier = %identifier,
            ai_route = is_ai_route,
            count = state.count,
            limit = limit,
            "Request allowed"
        );
        RateLimitResult::Allowed
    }

    /// Drop windows that expired more than one full window ago.
    pub async fn cleanup_expired(&self) {
        let window = Duration::from_secs(self.config.window_seconds);
        let now = Instant::now();

        let mut windows = self.windows.write().await;
        windows.retain(|_, state| now.duration_since(state.window_start) < window * 2);
    }
}

impl Default for RateLimitService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight_config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            general_limit: 3,
            ai_limit: 1,
            window_seconds: 3600,
        }
    }

    #[tokio::test]
    async fn test_requests_under_limit_are_allowed() {
        let service = RateLimitService::with_config(tight_config());

        for _ in 0..3 {
            assert_eq!(
                service.check_rate_limit("U_TEST01", false).await,
                RateLimitResult::Allowed
            );
        }
    }

    #[tokio::test]
    async fn test_requests_over_limit_are_rejected() {
        let service = RateLimitService::with_config(tight_config());

        for _ in 0..3 {
            service.check_rate_limit("U_TEST01", false).await;
        }

        assert!(matches!(
            service.check_rate_limit("U_TEST01", false).await,
            RateLimitResult::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_ai_routes_count_separately() {
        let service = RateLimitService::with_config(tight_config());

        assert_eq!(
            service.check_rate_limit("U_TEST01", true).await,
            RateLimitResult::Allowed
        );
        assert!(matches!(
            service.check_rate_limit("U_TEST01", true).await,
            RateLimitResult::Limited { .. }
        ));
        // General requests still pass; only the AI budget is spent.
        assert_eq!(
            service.check_rate_limit("U_TEST01", false).await,
            RateLimitResult::Allowed
        );
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let service = RateLimitService::with_config(tight_config());

        service.check_rate_limit("U_A", true).await;
        assert_eq!(
            service.check_rate_limit("U_B", true).await,
            RateLimitResult::Allowed
        );
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let service = RateLimitService::with_config(RateLimitConfig {
            enabled: false,
            ..tight_config()
        });

        for _ in 0..50 {
            assert_eq!(
                service.check_rate_limit("U_TEST01", true).await,
                RateLimitResult::Allowed
            );
        }
    }
}
