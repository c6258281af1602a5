//! HTTP adapters - REST API implementations.
//!
//! [`router`] assembles the full application: the relay endpoints under
//! `/api` behind the rate limiter, the health check, CORS and request tracing.

pub mod middleware;
pub mod relay;

pub use relay::{relay_routes, RelayState};

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use middleware::{rate_limit_middleware, RateLimiterState};

/// Builds the application router.
///
/// Pass `None` for `limiter` to serve without rate limiting.
pub fn router(
    state: RelayState,
    limiter: Option<RateLimiterState>,
    cors_origins: &[String],
) -> Router {
    let mut api = relay_routes(state);
    if let Some(limiter) = limiter {
        api = api.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    Router::new()
        .nest("/api", api)
        .route("/health", get(relay::health))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the configured widget origins; `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| tracing::warn!(%origin, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
