//! Rate limit configuration types.

use serde::{Deserialize, Serialize};

use crate::ports::RateLimitScope;

/// Complete rate limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Global rate limits (infrastructure protection).
    pub global: WindowLimits,
    /// Per-IP rate limits (abuse protection).
    pub per_ip: WindowLimits,
}

/// Requests allowed in one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimits {
    /// Maximum requests per window.
    pub requests_per_window: u32,
    /// Window duration in seconds.
    pub window_secs: u32,
}

impl WindowLimits {
    pub fn new(requests_per_window: u32, window_secs: u32) -> Self {
        Self {
            requests_per_window,
            window_secs,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: WindowLimits::new(10_000, 900),
            per_ip: WindowLimits::new(100, 900),
        }
    }
}

impl RateLimitConfig {
    /// Uses the given per-IP limits with the default global limit.
    pub fn per_ip(requests_per_window: u32, window_secs: u32) -> Self {
        Self {
            per_ip: WindowLimits::new(requests_per_window, window_secs),
            ..Self::default()
        }
    }

    /// Get the limits for a scope.
    pub fn limits_for(&self, scope: RateLimitScope) -> WindowLimits {
        match scope {
            RateLimitScope::Global => self.global,
            RateLimitScope::Ip => self.per_ip,
        }
    }
}
