//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured `server.log_level`
//! directive is used. Production emits JSON lines, development the pretty
//! human-readable format.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Installs the global subscriber. Call once, before anything logs.
pub fn init(server: &ServerConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
