//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Failed to read chat config {path}: {message}")]
    ChatConfigUnreadable { path: String, message: String },
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host address: {0}")]
    InvalidHost(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid AI request timeout")]
    InvalidTimeout,

    #[error("Invalid AI base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Rate limit window and request count must be positive")]
    InvalidRateLimit,

    #[error("Match threshold must be between 0 and 1, got {0}")]
    InvalidMatchThreshold(f64),
}
