//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application services and the outside world. Adapters implement them.
//!
//! ## AI Ports
//!
//! - `AIProvider` - Chat completions, streamed or schema-constrained
//! - `ContentModerator` - Policy classification of user text
//!
//! ## Infrastructure Ports
//!
//! - `RateLimiter` - Request quotas per client

mod ai_provider;
mod moderation;
mod rate_limiter;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream, FinishReason,
    Message, MessageRole, ResponseFormat, StreamChunk, TokenUsage,
};
pub use moderation::{ContentModerator, ModerationClassification};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
