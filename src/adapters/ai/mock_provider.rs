//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider and
//! ContentModerator ports, allowing tests to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses, JSON replies and refusals
//! - Streams that fail part-way through
//! - Scripted moderation results
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_json_response(json!({ "destination": "Bali" }));
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream,
    ContentModerator, FinishReason, ModerationClassification, StreamChunk, TokenUsage,
};

/// Mock AI provider for testing.
///
/// Configurable to return specific responses, simulate delays, or inject errors.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured completions (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Pre-configured moderation results (consumed in order).
    moderations: Arc<Mutex<VecDeque<Result<ModerationClassification, MockError>>>>,
    /// Model name reported in responses.
    model: String,
    /// Completion call history.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Moderation call history.
    moderated: Arc<Mutex<Vec<String>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success {
        content: String,
        refusal: Option<String>,
        finish_reason: FinishReason,
    },
    /// Stream `partial`, then fail with `error`.
    Interrupted { partial: String, error: MockError },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate content filtering.
    ContentFiltered { reason: String },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            moderations: Arc::new(Mutex::new(VecDeque::new())),
            model: "mock-model-1".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            moderated: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: content.into(),
            refusal: None,
            finish_reason: FinishReason::Stop,
        })
    }

    /// Adds a response whose content is `value` serialized as JSON.
    pub fn with_json_response(self, value: Value) -> Self {
        self.with_response(value.to_string())
    }

    /// Adds a refusal to the queue.
    pub fn with_refusal(self, refusal: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: String::new(),
            refusal: Some(refusal.into()),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Adds a stream that yields `partial` and then fails.
    pub fn with_interrupted_stream(self, partial: impl Into<String>, error: MockError) -> Self {
        self.push(MockResponse::Interrupted {
            partial: partial.into(),
            error,
        })
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    /// Adds a moderation result to the queue.
    pub fn with_moderation(self, classification: ModerationClassification) -> Self {
        self.moderations.lock().unwrap().push_back(Ok(classification));
        self
    }

    /// Adds a failing moderation call to the queue.
    pub fn with_moderation_error(self, error: MockError) -> Self {
        self.moderations.lock().unwrap().push_back(Err(error));
        self
    }

    /// Sets simulated latency per request.
    /// Returns the number of completion calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded completion calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns every text sent for moderation.
    pub fn moderated_texts(&self) -> Vec<String> {
        self.moderated.lock().unwrap().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.moderated.lock().unwrap().clear();
    }

    /// Gets the next response or a default.
    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
                refusal: None,
                finish_reason: FinishReason::Stop,
            })
    }

    fn record(&self, request: CompletionRequest) {
        self.calls.lock().unwrap().push(request);
    }
}

/// Splits text into word-sized fragments that concatenate back to it.
fn fragments(content: &str) -> Vec<Result<StreamChunk, AIError>> {
    content
        .split_inclusive(' ')
        .map(|word| Ok(StreamChunk::content(word)))
        .collect()
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        self.record(request);

        match self.next_response() {
            MockResponse::Success {
                content,
                refusal,
                finish_reason,
            } => Ok(CompletionResponse {
                content,
                refusal,
                usage: TokenUsage::new(10, 20),
                model: self.model.clone(),
                finish_reason,
            }),
            MockResponse::Interrupted { error, .. } | MockResponse::Error(error) => {
                Err(error.into())
            }
        }
    }

    async fn stream_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, AIError> {
        self.record(request);

        match self.next_response() {
            MockResponse::Success {
                content,
                finish_reason,
                ..
            } => {
                let last = stream::once(async move { Ok(StreamChunk::final_chunk(finish_reason)) });
                Ok(Box::pin(stream::iter(fragments(&content)).chain(last)))
            }
            MockResponse::Interrupted { partial, error } => {
                let failure = stream::once(async move { Err(AIError::from(error)) });
                Ok(Box::pin(stream::iter(fragments(&partial)).chain(failure)))
            }
            MockResponse::Error(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ContentModerator for MockAIProvider {
    async fn classify(&self, text: &str) -> Result<ModerationClassification, AIError> {
        self.moderated.lock().unwrap().push(text.to_string());

        let next = self.moderations.lock().unwrap().pop_front();
        match next {
            Some(Ok(classification)) => Ok(classification),
            Some(Err(error)) => Err(error.into()),
            None => Ok(ModerationClassification::clean()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Message;
    use serde_json::json;

    fn test_request() -> CompletionRequest {
        CompletionRequest::new().with_messages(vec![Message::user("Hello")])
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_response() {
        let provider = MockAIProvider::new().with_response("Hello from mock!");

        let response = provider.complete(test_request()).await.unwrap();

        assert_eq!(response.content, "Hello from mock!");
        assert_eq!(response.model, "mock-model-1");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert!(!response.is_refusal());
    }

    #[tokio::test]
    async fn mock_provider_returns_responses_in_order() {
        let provider = MockAIProvider::new()
            .with_response("First")
            .with_json_response(json!({ "a": 1 }))
            .with_refusal("No");

        let r1 = provider.complete(test_request()).await.unwrap();
        let r2 = provider.complete(test_request()).await.unwrap();
        let r3 = provider.complete(test_request()).await.unwrap();

        assert_eq!(r1.content, "First");
        assert_eq!(r2.content, r#"{"a":1}"#);
        assert_eq!(r3.refusal.as_deref(), Some("No"));
    }

    #[tokio::test]
    async fn mock_provider_returns_default_after_exhausted() {
        let provider = MockAIProvider::new().with_response("Only one");

        provider.complete(test_request()).await.unwrap();
        let r2 = provider.complete(test_request()).await.unwrap();

        assert_eq!(r2.content, "Mock response");
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_error() {
        let provider =
            MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });

        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn mock_provider_tracks_calls() {
        let provider = MockAIProvider::new();
        assert_eq!(provider.call_count(), 0);

        provider.complete(test_request()).await.unwrap();
        provider.stream_complete(test_request()).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.get_calls()[0].messages[0].content, "Hello");

        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn streaming_fragments_reassemble_exactly() {
        let provider = MockAIProvider::new().with_response("Hello world  from streaming");

        let mut stream = provider.stream_complete(test_request()).await.unwrap();

        let mut content = String::new();
        let mut final_chunk = None;
        while let Some(result) = stream.next().await {
            let chunk = result.unwrap();
            if chunk.is_final() {
                final_chunk = Some(chunk);
            } else {
                content.push_str(&chunk.delta);
            }
        }

        assert_eq!(content, "Hello world  from streaming");
        assert_eq!(final_chunk.unwrap().finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn interrupted_stream_fails_after_partial_content() {
        let provider = MockAIProvider::new().with_interrupted_stream(
            "Partial reply",
            MockError::Network {
                message: "reset".to_string(),
            },
        );

        let results: Vec<_> = provider
            .stream_complete(test_request())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(results[0].as_ref().unwrap().delta, "Partial ");
        assert!(matches!(results.last(), Some(Err(AIError::Network(_)))));
    }

    #[tokio::test]
    async fn mock_provider_streaming_returns_error() {
        let provider = MockAIProvider::new().with_error(MockError::Unavailable {
            message: "Service down".to_string(),
        });

        match provider.stream_complete(test_request()).await {
            Ok(_) => panic!("Expected error, got stream"),
            Err(err) => assert!(matches!(err, AIError::Unavailable { .. })),
        }
    }

    #[tokio::test]
    async fn moderation_defaults_to_clean_and_records_input() {
        let provider = MockAIProvider::new()
            .with_moderation(ModerationClassification::flagged(["harassment"]));

        let first = provider.classify("you are awful").await.unwrap();
        let second = provider.classify("hello").await.unwrap();

        assert!(first.flagged);
        assert_eq!(first.categories.get("harassment"), Some(&true));
        assert_eq!(second, ModerationClassification::clean());
        assert_eq!(provider.moderated_texts(), vec!["you are awful", "hello"]);
    }

    #[tokio::test]
    async fn moderation_error_is_returned() {
        let provider = MockAIProvider::new()
            .with_moderation_error(MockError::AuthenticationFailed);

        let err = provider.classify("hi").await.unwrap_err();
        assert!(matches!(err, AIError::AuthenticationFailed));
    }

    #[test]
    fn mock_error_converts_to_ai_error() {
        let err: AIError = MockError::ContentFiltered {
            reason: "unsafe".to_string(),
        }
        .into();
        assert!(matches!(err, AIError::ContentFiltered { .. }));

        let err: AIError = MockError::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, AIError::Timeout { timeout_secs: 30 }));
    }
}
