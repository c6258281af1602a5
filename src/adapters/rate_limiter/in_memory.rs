//! In-memory rate limiter implementation.
//!
//! Uses a fixed-window counter algorithm with an in-memory HashMap.
//! Suitable for a single relay instance.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ports::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope, RateLimitStatus,
    RateLimiter,
};

use super::config::RateLimitConfig;

/// In-memory fixed-window rate limiter.
///
/// Each window tracks the count of requests and resets when it expires.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    /// Rate limit configuration.
    config: RateLimitConfig,
    /// Per-key window state.
    windows: Arc<RwLock<HashMap<String, WindowState>>>,
}

/// State for a single rate limit window.
#[derive(Debug, Clone)]
struct WindowState {
    /// Number of requests in the current window.
    count: u32,
    /// When the current window started.
    window_start: DateTime<Utc>,
}

impl WindowState {
    fn window_end(&self, window_secs: u32) -> DateTime<Utc> {
        self.window_start + Duration::seconds(i64::from(window_secs))
    }
}

impl InMemoryRateLimiter {
    /// Create a new in-memory rate limiter.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of keys currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }

    /// Drops windows that have already expired.
    pub async fn purge_expired(&self) {
        let now = Utc::now();
        let longest = self
            .config
            .global
            .window_secs
            .max(self.config.per_ip.window_secs);

        self.windows
            .write()
            .await
            .retain(|_, state| state.window_end(longest) > now);
    }
}

fn denial_message(scope: RateLimitScope) -> &'static str {
    match scope {
        RateLimitScope::Ip => "Too many requests from this IP, please try again later",
        RateLimitScope::Global => "Too many requests, please try again later",
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let limits = self.config.limits_for(key.scope);
        let now = Utc::now();

        let mut windows = self.windows.write().await;

        let state = windows
            .entry(key.storage_key())
            .or_insert_with(|| WindowState {
                count: 0,
                window_start: now,
            });

        if now >= state.window_end(limits.window_secs) {
            state.count = 0;
            state.window_start = now;
        }

        let reset_at = state.window_end(limits.window_secs);

        if state.count >= limits.requests_per_window {
            let retry_after = (reset_at - now).num_seconds().max(1) as u32;

            return Ok(RateLimitResult::Denied(RateLimitDenied {
                limit: limits.requests_per_window,
                retry_after_secs: retry_after,
                scope: key.scope,
                message: denial_message(key.scope).to_string(),
            }));
        }

        state.count += 1;

        Ok(RateLimitResult::Allowed(RateLimitStatus {
            limit: limits.requests_per_window,
            remaining: limits.requests_per_window.saturating_sub(state.count),
            reset_at,
            window_secs: limits.window_secs,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::WindowLimits;
    use crate::ports::RateLimitScope;

    fn limiter(limit: u32) -> InMemoryRateLimiter {
        InMemoryRateLimiter::new(RateLimitConfig::per_ip(limit, 900))
    }

    #[tokio::test]
    async fn allows_requests_within_limit() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig::default());
        let key = RateLimitKey::ip("192.168.1.1");

        for i in 0..10 {
            let result = limiter.check(key.clone()).await.unwrap();
            assert!(result.is_allowed(), "Request {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn denies_request_after_limit() {
        let limiter = limiter(5);
        let key = RateLimitKey::ip("192.168.1.1");

        for _ in 0..5 {
            assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        }

        match limiter.check(key.clone()).await.unwrap() {
            RateLimitResult::Denied(denied) => {
                assert_eq!(denied.limit, 5);
                assert!(denied.retry_after_secs > 0);
                assert!(denied.retry_after_secs <= 900);
                assert_eq!(denied.scope, RateLimitScope::Ip);
            }
            RateLimitResult::Allowed(_) => panic!("sixth request should be denied"),
        }
    }

    #[tokio::test]
    async fn expired_window_starts_over() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig::per_ip(1, 0));
        let key = RateLimitKey::ip("10.0.0.3");

        assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        assert!(limiter.check(key).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn different_ips_have_independent_limits() {
        let limiter = limiter(1);

        limiter.check(RateLimitKey::ip("1.1.1.1")).await.unwrap();
        assert!(limiter.check(RateLimitKey::ip("1.1.1.1")).await.unwrap().is_denied());
        assert!(limiter.check(RateLimitKey::ip("2.2.2.2")).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn purge_drops_expired_windows() {
        let limiter = InMemoryRateLimiter::new(RateLimitConfig {
            global: WindowLimits::new(1, 0),
            per_ip: WindowLimits::new(1, 0),
        });

        limiter.check(RateLimitKey::ip("1.1.1.1")).await.unwrap();
        assert_eq!(limiter.tracked_keys().await, 1);

        limiter.purge_expired().await;
        assert_eq!(limiter.tracked_keys().await, 0);
    }

    #[tokio::test]
    async fn remaining_decrements_correctly() {
        let limiter = limiter(10);
        let key = RateLimitKey::ip("test-ip");

        for expected_remaining in (0..10u32).rev() {
            match limiter.check(key.clone()).await.unwrap() {
                RateLimitResult::Allowed(status) => {
                    assert_eq!(status.remaining, expected_remaining)
                }
                RateLimitResult::Denied(_) => panic!("should be allowed"),
            }
        }
    }
}
