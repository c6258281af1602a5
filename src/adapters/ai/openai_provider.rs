//! OpenAI Provider - Implementation of AIProvider and ContentModerator for
//! OpenAI's API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! Uses Server-Sent Events (SSE) for streaming responses. Network chunks do
//! not align with SSE lines, so bytes are buffered until a full line arrives.
//! Each `data:` line is parsed and yielded as a `StreamChunk` until the
//! `[DONE]` marker is received.
//!
//! The configured timeout bounds connecting and waiting for response
//! headers on every call. Only non-streaming calls also bound reading the
//! body, so a long chat reply is never cut off mid-stream.
//!
//! # Structured output
//!
//! A request carrying a `ResponseFormat` is sent with
//! `response_format: {"type": "json_schema", ...}`. Refusals come back in the
//! message's `refusal` member and are passed through untouched.

use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream,
    ContentModerator, FinishReason, MessageRole, ModerationClassification, ResponseFormat,
    StreamChunk, TokenUsage,
};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Chat model (e.g., "gpt-4o-mini").
    pub model: String,
    /// Moderation model (e.g., "omni-moderation-latest").
    pub moderation_model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Connect and response timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            moderation_model: "omni-moderation-latest".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the moderation model.
    pub fn with_moderation_model(mut self, model: impl Into<String>) -> Self {
        self.moderation_model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// How much of an exchange the configured timeout covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    /// Until the full body has been read.
    WholeResponse,
    /// Until the response headers arrive.
    Headers,
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| AIError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn moderations_url(&self) -> String {
        format!("{}/moderations", self.config.base_url)
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &CompletionRequest, stream: bool) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system",
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                },
                content: msg.content.clone(),
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            stream: Some(stream),
            response_format: request.response_format.as_ref().map(OpenAIResponseFormat::from),
        }
    }

    /// Posts a JSON body and checks the status.
    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: String,
        body: &B,
        deadline: Deadline,
    ) -> Result<Response, AIError> {
        let mut request = self
            .client
            .post(url)
            .bearer_auth(self.config.api_key())
            .json(body);
        if deadline == Deadline::WholeResponse {
            request = request.timeout(self.config.timeout);
        }

        let response = tokio::time::timeout(self.config.timeout, request.send())
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| self.map_send_error(e))?;

        Self::handle_response_status(response).await
    }

    fn timeout_error(&self) -> AIError {
        AIError::Timeout {
            timeout_secs: self.config.timeout.as_secs() as u32,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> AIError {
        if e.is_timeout() {
            self.timeout_error()
        } else if e.is_connect() {
            AIError::network(format!("Connection failed: {}", e))
        } else {
            AIError::network(e.to_string())
        }
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let header_retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());
        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => {
                let retry_after =
                    header_retry_after.unwrap_or_else(|| Self::parse_retry_after(&error_body));
                Err(AIError::rate_limited(retry_after))
            }
            400..=499 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        let message = serde_json::from_str::<Value>(error_body)
            .ok()
            .and_then(|parsed| {
                parsed
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(String::from)
            });

        if let Some(s) = message {
            if let Some(idx) = s.find("try again in ") {
                let rest = &s[idx + 13..];
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                if let Ok(secs) = digits.parse::<u32>() {
                    return secs;
                }
            }
        }
        30
    }

    /// Parses a non-streaming response.
    async fn parse_response(response: Response) -> Result<CompletionResponse, AIError> {
        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            refusal: choice.message.refusal,
            usage,
            model: openai_response.model,
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref()),
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let body = self.to_openai_request(&request, false);
        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            structured = body.response_format.is_some(),
            trace_id = request.trace_id.as_deref().unwrap_or(""),
            "Sending completion request"
        );

        let response = self
            .post_json(self.completions_url(), &body, Deadline::WholeResponse)
            .await?;
        let completion = Self::parse_response(response).await?;

        tracing::debug!(
            model = %completion.model,
            prompt_tokens = completion.usage.prompt_tokens,
            completion_tokens = completion.usage.completion_tokens,
            refused = completion.is_refusal(),
            "Completion received"
        );
        Ok(completion)
    }

    async fn stream_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, AIError> {
        let body = self.to_openai_request(&request, true);
        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            trace_id = request.trace_id.as_deref().unwrap_or(""),
            "Opening completion stream"
        );

        let response = self
            .post_json(self.completions_url(), &body, Deadline::Headers)
            .await?;

        let stream = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk_result| {
                let items = match chunk_result {
                    Ok(bytes) => decoder.push(&bytes),
                    Err(e) => vec![Err(AIError::network(format!("Stream error: {}", e)))],
                };
                future::ready(Some(stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl ContentModerator for OpenAIProvider {
    async fn classify(&self, text: &str) -> Result<ModerationClassification, AIError> {
        let body = ModerationRequest {
            model: &self.config.moderation_model,
            input: text,
        };

        let response = self
            .post_json(self.moderations_url(), &body, Deadline::WholeResponse)
            .await?;
        let parsed: ModerationResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse moderation response: {}", e)))?;

        let result = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No results in moderation response"))?;

        Ok(ModerationClassification {
            flagged: result.flagged,
            categories: result.categories,
        })
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

/// Incremental SSE decoder.
///
/// Holds the bytes of an incomplete line between network chunks, so events
/// split mid-line (or mid UTF-8 sequence) decode correctly.
#[derive(Debug, Default)]
struct SseDecoder {
    pending: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, AIError>> {
        if self.done {
            return Vec::new();
        }
        self.pending.extend_from_slice(bytes);

        let mut results = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(result) = self.decode_line(line) {
                results.push(result);
            }
            if self.done {
                self.pending.clear();
                break;
            }
        }
        results
    }

    fn decode_line(&mut self, line: &str) -> Option<Result<StreamChunk, AIError>> {
        let data = line.strip_prefix("data:")?.trim_start();

        if data == "[DONE]" {
            self.done = true;
            return None;
        }
        if data.is_empty() {
            return None;
        }

        let chunk = match serde_json::from_str::<StreamResponseChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                return Some(Err(AIError::parse(format!(
                    "Failed to parse SSE chunk: {}",
                    e
                ))))
            }
        };

        let choice = chunk.choices.into_iter().next()?;
        if let Some(reason) = choice.finish_reason {
            let mut last = StreamChunk::final_chunk(parse_finish_reason(Some(&reason)));
            last.delta = choice.delta.content.unwrap_or_default();
            return Some(Ok(last));
        }

        match choice.delta.content {
            Some(content) if !content.is_empty() => Some(Ok(StreamChunk::content(content))),
            _ => None,
        }
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: OpenAIJsonSchema,
}

#[derive(Debug, Serialize)]
struct OpenAIJsonSchema {
    name: String,
    schema: Value,
    strict: bool,
}

impl From<&ResponseFormat> for OpenAIResponseFormat {
    fn from(format: &ResponseFormat) -> Self {
        Self {
            kind: "json_schema",
            json_schema: OpenAIJsonSchema {
                name: format.name.clone(),
                schema: format.schema.clone(),
                strict: format.strict,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Message;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new(OpenAIConfig::new("test-key")).unwrap()
    }

    fn deltas(results: &[Result<StreamChunk, AIError>]) -> Vec<String> {
        results
            .iter()
            .map(|r| r.as_ref().unwrap().delta.clone())
            .collect()
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o")
            .with_moderation_model("text-moderation-latest")
            .with_base_url("https://custom.api.com/v1/")
            .with_timeout(Duration::from_secs(30));

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.moderation_model, "text-moderation-latest");
        assert_eq!(config.base_url, "https://custom.api.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = OpenAIConfig::new("sk-very-secret");
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }

    #[test]
    fn request_puts_system_prompt_first() {
        let request = CompletionRequest::new()
            .with_system_prompt("Be brief")
            .with_messages(vec![Message::user("Hi"), Message::assistant("Hello")]);

        let body = serde_json::to_value(provider().to_openai_request(&request, true)).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(
            body["messages"],
            json!([
                { "role": "system", "content": "Be brief" },
                { "role": "user", "content": "Hi" },
                { "role": "assistant", "content": "Hello" }
            ])
        );
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn request_carries_strict_json_schema() {
        let schema = json!({
            "type": "object",
            "properties": {},
            "required": [],
            "additionalProperties": false
        });
        let request = CompletionRequest::new()
            .with_messages(vec![Message::user("Hi")])
            .with_response_format(ResponseFormat::json_schema("search_data", schema.clone()));

        let body = serde_json::to_value(provider().to_openai_request(&request, false)).unwrap();

        assert_eq!(
            body["response_format"],
            json!({
                "type": "json_schema",
                "json_schema": { "name": "search_data", "schema": schema, "strict": true }
            })
        );
    }

    /// Serves one connection with `respond` and returns a provider pointed at it.
    async fn local_provider<F, Fut>(timeout: Duration, respond: F) -> OpenAIProvider
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut request).await;
            respond(socket).await;
        });

        let config = OpenAIConfig::new("test-key")
            .with_base_url(format!("http://{}", addr))
            .with_timeout(timeout);
        OpenAIProvider::new(config).unwrap()
    }

    fn sse_event(content: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({ "choices": [{ "delta": { "content": content }, "finish_reason": null }] })
        )
    }

    #[tokio::test]
    async fn stream_may_outlast_the_timeout() {
        let provider = local_provider(Duration::from_millis(200), |mut socket| async move {
            let head = "HTTP/1.1 200 OK\r\n\
                        content-type: text/event-stream\r\n\
                        connection: close\r\n\r\n";
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(sse_event("Hello").as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            socket.write_all(sse_event(" world").as_bytes()).await.unwrap();
            socket.write_all(b"data: [DONE]\n\n").await.unwrap();
        })
        .await;

        let request = CompletionRequest::new().with_messages(vec![Message::user("Hi")]);
        let chunks: Vec<_> = provider.stream_complete(request).await.unwrap().collect().await;

        let text: String = chunks
            .iter()
            .map(|chunk| chunk.as_ref().unwrap().delta.as_str())
            .collect();
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn stream_times_out_waiting_for_headers() {
        let provider = local_provider(Duration::from_millis(200), |socket| async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        })
        .await;

        let request = CompletionRequest::new().with_messages(vec![Message::user("Hi")]);
        let err = provider.stream_complete(request).await.err().unwrap();

        assert!(matches!(err, AIError::Timeout { .. }));
    }

    #[test]
    fn sse_content_chunk() {
        let mut decoder = SseDecoder::new();
        let results = decoder.push(
            b"data: {\"id\":\"chatcmpl-123\",\"choices\":[{\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\n",
        );

        assert_eq!(deltas(&results), vec!["Hello"]);
        assert!(!results[0].as_ref().unwrap().is_final());
    }

    #[test]
    fn sse_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        let first = decoder.push(b"data: {\"choices\":[{\"delta\":{\"con");
        assert!(first.is_empty());

        let second = decoder.push(b"tent\":\"Hi\"},\"finish_reason\":null}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\" there\"},\"finish_reason\":null}]}\n");
        assert_eq!(deltas(&second), vec!["Hi", " there"]);
    }

    #[test]
    fn sse_multibyte_character_split_across_chunks() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"},\"finish_reason\":null}]}\n";
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(deltas(&decoder.push(&bytes[split..])), vec!["café"]);
    }

    #[test]
    fn sse_final_chunk() {
        let mut decoder = SseDecoder::new();
        let results = decoder.push(b"data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n");

        let chunk = results[0].as_ref().unwrap();
        assert!(chunk.is_final());
        assert_eq!(chunk.finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn sse_done_marker_ends_decoding() {
        let mut decoder = SseDecoder::new();
        let results = decoder.push(
            b"data: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"},\"finish_reason\":null}]}\n",
        );
        assert!(results.is_empty());
        assert!(decoder.push(b"data: {}\n").is_empty());
    }

    #[test]
    fn sse_ignores_comments_and_blank_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b": keep-alive\n\n\r\n").is_empty());
    }

    #[test]
    fn sse_malformed_data_is_an_error() {
        let mut decoder = SseDecoder::new();
        let results = decoder.push(b"data: {not json}\n");
        assert!(matches!(results[0], Err(AIError::Parse(_))));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 30 seconds."}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 30);
    }

    #[test]
    fn parse_retry_after_default() {
        let error = r#"{"error":{"message":"Something went wrong"}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 30);
    }

    #[test]
    fn moderation_response_deserializes() {
        let parsed: ModerationResponse = serde_json::from_value(json!({
            "id": "modr-1",
            "model": "omni-moderation-latest",
            "results": [{
                "flagged": true,
                "categories": { "harassment": true, "violence": false },
                "category_scores": { "harassment": 0.91, "violence": 0.01 }
            }]
        }))
        .unwrap();

        assert!(parsed.results[0].flagged);
        assert_eq!(parsed.results[0].categories.get("harassment"), Some(&true));
    }

    #[test]
    fn response_message_with_refusal_deserializes() {
        let parsed: OpenAIResponse = serde_json::from_value(json!({
            "model": "gpt-4o-mini",
            "choices": [{
                "message": { "role": "assistant", "content": null, "refusal": "I can't help with that." },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        let message = &parsed.choices[0].message;
        assert!(message.content.is_none());
        assert_eq!(message.refusal.as_deref(), Some("I can't help with that."));
    }
}
