//! Rate limiting middleware for axum.
//!
//! This module provides middleware that enforces rate limits using the `RateLimiter` port.
//!
//! # Architecture
//!
//! The middleware checks two scopes in order:
//! 1. Per-IP rate limit (abuse protection)
//! 2. Global rate limit (infrastructure protection)
//!
//! A request denied per IP never takes a global slot.
//!
//! Clients are keyed by socket address. `X-Forwarded-For` and `X-Real-IP`
//! are only read when the state is built with `trust_forwarded_headers(true)`.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::post, middleware};
//! use std::sync::Arc;
//!
//! let limiter = InMemoryRateLimiter::new(RateLimitConfig::default());
//! let state = RateLimiterState::new(Arc::new(limiter));
//!
//! let app = Router::new()
//!     .route("/api/chat", post(handler))
//!     .layer(middleware::from_fn_with_state(state, rate_limit_middleware));
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::ports::{RateLimitDenied, RateLimitKey, RateLimitResult, RateLimiter};

/// Rate limiter middleware state.
#[derive(Clone)]
pub struct RateLimiterState {
    limiter: Arc<dyn RateLimiter>,
    trust_forwarded_headers: bool,
}

impl RateLimiterState {
    /// Keys clients by their socket address.
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter,
            trust_forwarded_headers: false,
        }
    }

    /// Prefer `X-Forwarded-For` / `X-Real-IP` over the socket address.
    pub fn trust_forwarded_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }
}

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    /// Maximum requests allowed in the window.
    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    /// Requests remaining in the current window.
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    /// Unix timestamp when the window resets.
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

/// Rate limiting middleware that checks IP and global limits.
///
/// Returns 429 Too Many Requests when either limit is exceeded. A failing
/// limiter backend lets the request through.
pub async fn rate_limit_middleware(
    State(state): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = &state.limiter;
    let client_ip = extract_client_ip(
        &request,
        connect_info.as_ref(),
        state.trust_forwarded_headers,
    );

    let ip_status = match &client_ip {
        Some(ip) => match limiter.check(RateLimitKey::ip(ip)).await {
            Ok(RateLimitResult::Denied(denied)) => {
                tracing::warn!(client_ip = %ip, "Rate limit exceeded");
                return rate_limit_response(&denied);
            }
            Ok(RateLimitResult::Allowed(status)) => Some(status),
            Err(e) => {
                tracing::warn!("Rate limiter unavailable for IP check: {}", e);
                None
            }
        },
        None => None,
    };

    match limiter.check(RateLimitKey::global()).await {
        Ok(RateLimitResult::Denied(denied)) => {
            tracing::warn!(scope = %denied.scope, "Global rate limit exceeded");
            return rate_limit_response(&denied);
        }
        Err(e) => tracing::warn!("Rate limiter unavailable: {}", e),
        Ok(RateLimitResult::Allowed(_)) => {}
    }

    let mut response = next.run(request).await;

    if let Some(status) = ip_status {
        let headers = response.headers_mut();
        headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.limit));
        headers.insert(
            headers::X_RATELIMIT_REMAINING.clone(),
            HeaderValue::from(status.remaining),
        );
        headers.insert(
            headers::X_RATELIMIT_RESET.clone(),
            HeaderValue::from(status.reset_at.timestamp()),
        );
    }

    response
}

/// Extract the client IP used as the per-IP key.
///
/// With `trust_forwarded` set, the order of precedence is:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
///
/// Otherwise only the socket address is used.
fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded: bool,
) -> Option<String> {
    if trust_forwarded {
        if let Some(forwarded) = request
            .headers()
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
        {
            if let Some(first_ip) = forwarded.split(',').next().map(str::trim) {
                if !first_ip.is_empty() {
                    return Some(first_ip.to_string());
                }
            }
        }

        if let Some(real_ip) = request
            .headers()
            .get("X-Real-IP")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return Some(real_ip.to_string());
        }
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

/// Create a 429 Too Many Requests response.
fn rate_limit_response(denied: &RateLimitDenied) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({ "error": denied.message })),
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(denied.limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
    headers.insert(header::RETRY_AFTER, HeaderValue::from(denied.retry_after_secs));

    response
}
