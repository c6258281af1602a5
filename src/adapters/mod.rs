//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - OpenAI provider and the scripted mock
//! - `http` - axum router, handlers and middleware
//! - `rate_limiter` - In-memory fixed-window limiter

pub mod ai;
pub mod http;
pub mod rate_limiter;
