//! HTTP DTOs for the relay endpoints.
//!
//! Bodies are accepted loosely (`Value`) where the widget's shape must be
//! checked by hand so that each route can answer with its own message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub search_config: Option<Value>,
}

/// Body of the extraction endpoints.
///
/// `searchConfig` is only read by `/api/search-data`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub current_data: Option<Value>,
    #[serde(default)]
    pub search_config: Option<Value>,
}

/// Body of `POST /api/moderate-user-message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModerationRequest {
    #[serde(default)]
    pub content: Option<Value>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Error body returned by every route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
