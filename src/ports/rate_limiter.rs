//! Rate limiting port for protecting the relay and the provider budget.
//!
//! This port defines the interface for rate limiting operations. The
//! in-memory adapter uses a fixed-window counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port for rate limiting operations.
///
/// Implementations should be thread-safe and support concurrent access.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check if request is allowed, consuming a slot if so.
    ///
    /// Returns `Allowed` with remaining quota or `Denied` with retry info.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;
}

/// Key identifying what to rate limit.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    /// The scope of this rate limit.
    pub scope: RateLimitScope,
    /// Identifier within the scope (e.g., IP address).
    pub identifier: String,
}

/// The scope at which rate limiting is applied.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// Global rate limit across all requests.
    Global,
    /// Per-IP address rate limit.
    Ip,
}

impl RateLimitKey {
    /// Creates a global rate limit key.
    pub fn global() -> Self {
        Self {
            scope: RateLimitScope::Global,
            identifier: "global".to_string(),
        }
    }

    /// Creates an IP-based rate limit key.
    pub fn ip(ip: &str) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: ip.to_string(),
        }
    }

    /// Returns the storage key for this rate limit key.
    pub fn storage_key(&self) -> String {
        format!("ratelimit:{}:{}", self.scope.as_str(), self.identifier)
    }
}

impl RateLimitScope {
    /// Returns the string representation of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Global => "global",
            RateLimitScope::Ip => "ip",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed; includes current status.
    Allowed(RateLimitStatus),
    /// Request is denied; includes denial details.
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    /// Returns true if the request was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }

    /// Returns true if the request was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, RateLimitResult::Denied(_))
    }
}

/// Current rate limit status.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// When the current window resets.
    pub reset_at: DateTime<Utc>,
    /// Window duration in seconds.
    pub window_secs: u32,
}

/// Details of a rate limit denial.
#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Seconds until the client should retry.
    pub retry_after_secs: u32,
    /// The scope that triggered the denial.
    pub scope: RateLimitScope,
    /// Human-readable message explaining the denial.
    pub message: String,
}

/// Errors that can occur during rate limiting operations.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate limiter backend is unavailable.
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_key_has_correct_scope() {
        let key = RateLimitKey::global();
        assert_eq!(key.scope, RateLimitScope::Global);
        assert_eq!(key.identifier, "global");
    }

    #[test]
    fn ip_key_has_correct_scope() {
        let key = RateLimitKey::ip("192.168.1.1");
        assert_eq!(key.scope, RateLimitScope::Ip);
        assert_eq!(key.identifier, "192.168.1.1");
    }

    #[test]
    fn storage_key_format() {
        assert_eq!(RateLimitKey::ip("10.0.0.1").storage_key(), "ratelimit:ip:10.0.0.1");
        assert_eq!(RateLimitKey::global().storage_key(), "ratelimit:global:global");
    }

    #[test]
    fn rate_limit_result_is_allowed_works() {
        let result = RateLimitResult::Allowed(RateLimitStatus {
            limit: 100,
            remaining: 50,
            reset_at: Utc::now(),
            window_secs: 900,
        });
        assert!(result.is_allowed());
        assert!(!result.is_denied());
    }

    #[test]
    fn rate_limit_result_is_denied_works() {
        let result = RateLimitResult::Denied(RateLimitDenied {
            limit: 100,
            retry_after_secs: 30,
            scope: RateLimitScope::Ip,
            message: "Rate limit exceeded".to_string(),
        });
        assert!(result.is_denied());
        assert!(!result.is_allowed());
    }
}
