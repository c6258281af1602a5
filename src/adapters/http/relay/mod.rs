//! HTTP adapter for the chat widget relay endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequest, ErrorResponse, ExtractionRequest, HealthResponse, ModerationRequest};
pub use handlers::{health, ApiError, RelayState};
pub use routes::relay_routes;
