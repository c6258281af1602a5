//! Rate limiter adapters.
//!
//! ## Usage
//!
//! ```ignore
//! use chat_relay::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
//!
//! let limiter = InMemoryRateLimiter::new(RateLimitConfig::per_ip(100, 900));
//! ```

mod config;
mod in_memory;

pub use config::{RateLimitConfig, WindowLimits};
pub use in_memory::InMemoryRateLimiter;
