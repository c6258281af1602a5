//! HTTP handlers for the relay endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use serde_json::{Map, Value};

use crate::application::{
    ContentGenerator, ExtractCustomerCommand, ExtractSearchDataCommand, ExtractionHandler,
    ModerateMessageCommand, ModerateMessageHandler, RelayError, StreamChatCommand,
    StreamChatHandler,
};
use crate::domain::content::{ContentResult, RawContentRequest};
use crate::domain::conversation::MessageSanitizer;
use crate::domain::customer::{CustomerIntention, CustomerProspect};
use crate::domain::moderation::ModerationVerdict;
use crate::domain::prompts::PromptBuilder;
use crate::ports::{AIProvider, ContentModerator, Message};

use super::dto::{
    ChatRequest, ErrorResponse, ExtractionRequest, HealthResponse, ModerationRequest,
};

const CHAT_FAILED: &str = "An error occurred";
const EXTRACTION_FAILED: &str = "An error occurred while processing the request";
const MODERATION_FAILED: &str = "An error occurred during moderation";
const CONTENT_FAILED: &str = "An error occurred while generating custom content";

// ════════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct RelayState {
    chat: Arc<StreamChatHandler>,
    extraction: Arc<ExtractionHandler>,
    content: Arc<ContentGenerator>,
    moderation: Arc<ModerateMessageHandler>,
    sanitizer: MessageSanitizer,
}

impl RelayState {
    pub fn new(
        ai_provider: Arc<dyn AIProvider>,
        moderator: Arc<dyn ContentModerator>,
        prompts: Arc<PromptBuilder>,
    ) -> Self {
        Self {
            chat: Arc::new(StreamChatHandler::new(ai_provider.clone(), prompts.clone())),
            extraction: Arc::new(ExtractionHandler::new(ai_provider.clone(), prompts.clone())),
            content: Arc::new(ContentGenerator::new(ai_provider, prompts)),
            moderation: Arc::new(ModerateMessageHandler::new(moderator)),
            sanitizer: MessageSanitizer::new(),
        }
    }

    /// Overrides the strong-match threshold for content generation.
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.content = Arc::new(self.content.as_ref().clone().with_match_threshold(threshold));
        self
    }

    /// Checks the shape of `messages` and sanitizes every content string.
    fn messages(
        &self,
        raw: Option<Value>,
        missing_message: &'static str,
    ) -> Result<Vec<Message>, ApiError> {
        let raw = raw.ok_or_else(|| ApiError::bad_request(missing_message))?;
        if !raw.is_array() {
            return Err(ApiError::bad_request("messages must be an array"));
        }

        let messages: Vec<Message> = serde_json::from_value(raw).map_err(|_| {
            ApiError::bad_request("each message must have a role and string content")
        })?;

        Ok(messages
            .into_iter()
            .map(|m| Message::new(m.role, self.sanitizer.sanitize(&m.content)))
            .collect())
    }
}

fn current_data(raw: Option<Value>) -> Result<Option<Map<String, Value>>, ApiError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ApiError::bad_request("currentData must be an object")),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/chat - Stream the assistant's next reply as plain text
pub async fn chat(
    State(state): State<RelayState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let messages = state.messages(req.messages, "messages required")?;

    let replies = state
        .chat
        .handle(StreamChatCommand {
            messages,
            search_config: req.search_config,
        })
        .await
        .map_err(|e| ApiError::relay(e, CHAT_FAILED))?;

    let body = Body::from_stream(
        replies.inspect_err(|e| tracing::error!(error = %e, "Chat stream interrupted")),
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// POST /api/search-data - Merge search data from the conversation
pub async fn search_data(
    State(state): State<RelayState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<Map<String, Value>>, ApiError> {
    let Json(req) = payload?;
    let messages = state.messages(req.messages, "messages and searchData are required")?;

    let cmd = ExtractSearchDataCommand {
        messages,
        current_data: current_data(req.current_data)?.unwrap_or_default(),
        search_config: req.search_config,
    };

    state
        .extraction
        .search_data(cmd)
        .await
        .map(Json)
        .map_err(|e| ApiError::relay(e, EXTRACTION_FAILED))
}

/// POST /api/customer-intention - Merge the customer's intention
pub async fn customer_intention(
    State(state): State<RelayState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<CustomerIntention>, ApiError> {
    let Json(req) = payload?;
    let cmd = ExtractCustomerCommand {
        messages: state.messages(req.messages, "messages are required")?,
        current_data: current_data(req.current_data)?,
    };

    state
        .extraction
        .customer_intention(cmd)
        .await
        .map(Json)
        .map_err(|e| ApiError::relay(e, EXTRACTION_FAILED))
}

/// POST /api/customer-prospect - Extract what the customer is looking for
pub async fn customer_prospect(
    State(state): State<RelayState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<CustomerProspect>, ApiError> {
    let Json(req) = payload?;
    let cmd = ExtractCustomerCommand {
        messages: state.messages(req.messages, "messages are required")?,
        current_data: current_data(req.current_data)?,
    };

    state
        .extraction
        .customer_prospect(cmd)
        .await
        .map(Json)
        .map_err(|e| ApiError::relay(e, EXTRACTION_FAILED))
}

/// POST /api/moderate-user-message - Classify one user message
pub async fn moderate_user_message(
    State(state): State<RelayState>,
    payload: Result<Json<ModerationRequest>, JsonRejection>,
) -> Result<Json<ModerationVerdict>, ApiError> {
    let Json(req) = payload?;
    let content = match req.content {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(_) => return Err(ApiError::bad_request("content must be a string")),
    };

    state
        .moderation
        .handle(ModerateMessageCommand { content })
        .await
        .map(Json)
        .map_err(|e| ApiError::relay(e, MODERATION_FAILED))
}

/// POST /api/generate-custom-content - Write personalised copy for an item
pub async fn generate_custom_content(
    State(state): State<RelayState>,
    payload: Result<Json<RawContentRequest>, JsonRejection>,
) -> Result<Json<ContentResult>, ApiError> {
    let Json(req) = payload?;

    state
        .content
        .generate(req)
        .await
        .map(Json)
        .map_err(|e| ApiError::relay(e, CONTENT_FAILED))
}

/// GET /health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts relay errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// `message` is returned to the caller; `detail` is only logged.
    Internal {
        message: &'static str,
        detail: String,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Caller faults become 400 with their own text; everything else is a
    /// 500 carrying the route's generic `message`.
    pub fn relay(err: RelayError, message: &'static str) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal {
                message,
                detail: err.to_string(),
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            ApiError::Internal { message, detail } => {
                tracing::error!(error = %detail, "Relay request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(message))
            }
        };

        (status, Json(error)).into_response()
    }
}
