//! AI Provider Port - Interface for LLM provider integrations.
//!
//! This port abstracts every chat-completion call the relay makes, so the
//! application services never depend on a specific provider.
//!
//! # Design
//!
//! - Streaming completions for the chat assistant
//! - Non-streaming completions, optionally constrained by a strict JSON schema
//! - Provider-agnostic message format
//! - Refusals are reported separately from content
//!
//! # Example
//!
//! ```ignore
//! let request = CompletionRequest::new()
//!     .with_system_prompt("Extract the search data")
//!     .with_messages(messages)
//!     .with_response_format(ResponseFormat::json_schema("search_data", schema));
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

/// Boxed stream of completion fragments.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, AIError>> + Send>>;

/// Port for AI/LLM provider interactions.
///
/// Implementations connect to an external AI service and translate between
/// the provider-specific API and these types.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generate a single completion (non-streaming).
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError>;

    /// Generate a streaming completion.
    ///
    /// Returns a stream of chunks as they arrive from the provider. Dropping
    /// the stream abandons the upstream call.
    async fn stream_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, AIError>;
}

/// Request for AI completion.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Conversation messages, oldest first.
    pub messages: Vec<Message>,
    /// System prompt placed before the conversation.
    pub system_prompt: Option<String>,
    /// Structured output constraint.
    pub response_format: Option<ResponseFormat>,
    /// Trace ID for log correlation.
    pub trace_id: Option<String>,
}

impl CompletionRequest {
    /// Creates an empty completion request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a whole conversation.
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Constrains the reply to a JSON schema.
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Sets the trace ID.
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// Strict JSON-schema output constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    /// Schema name reported to the provider.
    pub name: String,
    /// JSON Schema the reply must satisfy.
    pub schema: Value,
    /// Whether the provider must enforce the schema exactly.
    pub strict: bool,
}

impl ResponseFormat {
    /// Creates a strict schema constraint.
    pub fn json_schema(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }
}

/// Response from AI completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content. Empty when the model refused.
    pub content: String,
    /// Refusal message, when the model declined to answer.
    pub refusal: Option<String>,
    /// Token usage.
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
    /// Why the model stopped generating.
    pub finish_reason: FinishReason,
}

impl CompletionResponse {
    /// Creates a plain content response.
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            refusal: None,
            usage: TokenUsage::zero(),
            model: model.into(),
            finish_reason: FinishReason::Stop,
        }
    }

    /// Returns true when the model declined to answer.
    pub fn is_refusal(&self) -> bool {
        self.refusal.is_some()
    }
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Creates zero usage.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit the output token limit.
    Length,
    /// Content was filtered for safety.
    ContentFilter,
    /// An error occurred.
    Error,
}

/// Streaming chunk from AI completion.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// New content in this chunk.
    pub delta: String,
    /// If present, generation is complete.
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// Creates a content chunk.
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            finish_reason: None,
        }
    }

    /// Creates a final chunk.
    pub fn final_chunk(finish_reason: FinishReason) -> Self {
        Self {
            delta: String::new(),
            finish_reason: Some(finish_reason),
        }
    }

    /// Returns true if this is the final chunk.
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered {
        /// Reason for filtering.
        reason: String,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl AIError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a content filtered error.
    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completion_request_builder_works() {
        let request = CompletionRequest::new()
            .with_messages(vec![Message::user("Hello")])
            .with_system_prompt("Be helpful")
            .with_trace_id("trace-123");

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.messages[0].content, "Hello");
        assert_eq!(request.system_prompt, Some("Be helpful".to_string()));
        assert_eq!(request.trace_id.as_deref(), Some("trace-123"));
        assert!(request.response_format.is_none());
    }

    #[test]
    fn with_messages_keeps_order() {
        let request = CompletionRequest::new()
            .with_messages(vec![Message::user("one"), Message::assistant("two")])
            .with_messages(vec![Message::user("three")]);

        let contents: Vec<_> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[test]
    fn json_schema_format_is_strict() {
        let format = ResponseFormat::json_schema("search_data", json!({ "type": "object" }));
        assert_eq!(format.name, "search_data");
        assert!(format.strict);
    }

    #[test]
    fn message_constructors_work() {
        assert_eq!(Message::new(MessageRole::System, "x").role, MessageRole::System);
        assert_eq!(Message::user("x").role, MessageRole::User);
        assert_eq!(Message::assistant("x").role, MessageRole::Assistant);
    }

    #[test]
    fn message_deserializes_from_widget_json() {
        let message: Message =
            serde_json::from_value(json!({ "role": "user", "content": "Hi" })).unwrap();
        assert_eq!(message, Message::user("Hi"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result: Result<Message, _> =
            serde_json::from_value(json!({ "role": "tool", "content": "Hi" }));
        assert!(result.is_err());
    }

    #[test]
    fn token_usage_calculates_total() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(TokenUsage::zero().total_tokens, 0);
    }

    #[test]
    fn stream_chunk_content_is_not_final() {
        let chunk = StreamChunk::content("Hello");
        assert!(!chunk.is_final());
        assert_eq!(chunk.delta, "Hello");
    }

    #[test]
    fn stream_chunk_final_has_reason() {
        let chunk = StreamChunk::final_chunk(FinishReason::Stop);
        assert!(chunk.is_final());
        assert_eq!(chunk.delta, "");
    }

    #[test]
    fn text_response_is_not_a_refusal() {
        let response = CompletionResponse::text("{}", "gpt-4o-mini");
        assert!(!response.is_refusal());
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn finish_reason_serializes_snake_case() {
        let json = serde_json::to_string(&FinishReason::ContentFilter).unwrap();
        assert_eq!(json, "\"content_filter\"");
    }

    #[test]
    fn ai_error_displays_correctly() {
        assert_eq!(
            AIError::rate_limited(30).to_string(),
            "rate limited: retry after 30s"
        );
        assert_eq!(
            AIError::Timeout { timeout_secs: 60 }.to_string(),
            "request timed out after 60s"
        );
    }
}
