//! Request rate limit configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::adapters::rate_limiter::{RateLimitConfig, WindowLimits};

/// Fixed-window limits applied to every `/api` request
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Whether the limiter is installed at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Requests allowed per client IP in one window
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,

    /// Requests allowed across all clients in one window
    #[serde(default = "default_global_requests_per_window")]
    pub global_requests_per_window: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u32,

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the socket
    /// address. Only safe behind a proxy that overwrites those headers.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

impl RateLimitSettings {
    /// Limits in the form the limiter adapter expects
    pub fn limiter_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            global: WindowLimits::new(self.global_requests_per_window, self.window_secs),
            per_ip: WindowLimits::new(self.requests_per_window, self.window_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled
            && (self.requests_per_window == 0
                || self.global_requests_per_window == 0
                || self.window_secs == 0)
        {
            return Err(ValidationError::InvalidRateLimit);
        }
        Ok(())
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            requests_per_window: default_requests_per_window(),
            global_requests_per_window: default_global_requests_per_window(),
            window_secs: default_window_secs(),
            trust_forwarded_headers: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_requests_per_window() -> u32 {
    100
}

fn default_global_requests_per_window() -> u32 {
    10_000
}

fn default_window_secs() -> u32 {
    15 * 60
}
