use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chat_relay::adapters::ai::{OpenAIConfig, OpenAIProvider};
use chat_relay::adapters::http::middleware::RateLimiterState;
use chat_relay::adapters::http::{router, RelayState};
use chat_relay::adapters::rate_limiter::InMemoryRateLimiter;
use chat_relay::config::{AppConfig, ConfigError};
use chat_relay::domain::prompts::PromptBuilder;
use chat_relay::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(&config.server);

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<AppConfig, ConfigError> {
    let config = AppConfig::load()?;
    config.validate()?;
    Ok(config)
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let context = config.chat.business_context()?;
    let prompts = Arc::new(PromptBuilder::new(context));

    let api_key = config.ai.api_key().unwrap_or_default();
    let provider = Arc::new(OpenAIProvider::new(
        OpenAIConfig::new(api_key)
            .with_model(config.ai.model.as_str())
            .with_moderation_model(config.ai.moderation_model.as_str())
            .with_base_url(config.ai.base_url.as_str())
            .with_timeout(config.ai.timeout()),
    )?);

    let state = RelayState::new(provider.clone(), provider, prompts)
        .with_match_threshold(config.content.match_threshold);

    let limiter: Option<RateLimiterState> = if config.rate_limit.enabled {
        let limiter = InMemoryRateLimiter::new(config.rate_limit.limiter_config());
        spawn_window_purge(limiter.clone(), config.rate_limit.window_secs);
        Some(
            RateLimiterState::new(Arc::new(limiter))
                .trust_forwarded_headers(config.rate_limit.trust_forwarded_headers),
        )
    } else {
        tracing::warn!("Rate limiting is disabled");
        None
    };

    let app = router(state, limiter, &config.server.cors_origins_list());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        model = %config.ai.model,
        environment = ?config.server.environment,
        "Chat relay listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Drops expired rate-limit windows once per window length.
fn spawn_window_purge(limiter: InMemoryRateLimiter, window_secs: u32) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(u64::from(window_secs)));
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.purge_expired().await;
            let keys = limiter.tracked_keys().await;
            tracing::debug!(keys, "Purged expired rate limit windows");
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
