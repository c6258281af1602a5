//! HTTP routes for the relay endpoints.

use axum::{routing::post, Router};

use super::handlers::{
    chat, customer_intention, customer_prospect, generate_custom_content, moderate_user_message,
    search_data, RelayState,
};

/// Creates the relay router; mounted under `/api`.
pub fn relay_routes(state: RelayState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/search-data", post(search_data))
        .route("/customer-intention", post(customer_intention))
        .route("/customer-prospect", post(customer_prospect))
        .route("/moderate-user-message", post(moderate_user_message))
        .route("/generate-custom-content", post(generate_custom_content))
        .with_state(state)
}
