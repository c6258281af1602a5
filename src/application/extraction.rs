//! Structured extraction: search data, customer intention and prospect.
//!
//! Every extraction follows the same contract. The current state is
//! serialized into the instructions, the reply is constrained by a strict
//! JSON schema, and the reply is checked against that same schema before it
//! is returned. The merged object from the model is the new state.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::customer::{CustomerIntention, CustomerProspect};
use crate::domain::prompts::PromptBuilder;
use crate::domain::search::{conformance, simplify, SearchConfig};
use crate::ports::{AIProvider, CompletionRequest, Message, ResponseFormat};

use super::error::RelayError;

/// Name under which the simplified search schema is sent.
pub const SEARCH_DATA_SCHEMA_NAME: &str = "search_data";

/// Runs one schema-constrained completion and validates the reply.
#[derive(Clone)]
pub struct StructuredExtractor {
    ai_provider: Arc<dyn AIProvider>,
}

impl StructuredExtractor {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self { ai_provider }
    }

    /// Returns the reply as a JSON object conforming to `format.schema`.
    pub async fn extract(
        &self,
        instructions: String,
        messages: Vec<Message>,
        format: ResponseFormat,
    ) -> Result<Map<String, Value>, RelayError> {
        let schema_name = format.name.clone();
        let schema = format.schema.clone();

        let trace_id = Uuid::new_v4().to_string();
        let request = CompletionRequest::new()
            .with_system_prompt(instructions)
            .with_messages(messages)
            .with_response_format(format)
            .with_trace_id(trace_id.as_str());

        let response = self.ai_provider.complete(request).await?;

        if let Some(refusal) = response.refusal {
            tracing::warn!(
                %trace_id,
                schema = %schema_name,
                %refusal,
                "Model refused structured extraction"
            );
            return Err(RelayError::Refused(refusal));
        }

        let value: Value = serde_json::from_str(&response.content).map_err(|e| {
            RelayError::upstream_format(format!("{} reply is not JSON: {}", schema_name, e))
        })?;

        conformance::check(&value, &schema).map_err(|e| {
            RelayError::upstream_format(format!(
                "{} reply does not match schema {}",
                schema_name, e
            ))
        })?;

        match value {
            Value::Object(object) => Ok(object),
            _ => Err(RelayError::upstream_format(format!(
                "{} reply is not a JSON object",
                schema_name
            ))),
        }
    }

    /// Like [`extract`](Self::extract), deserialized into `T`.
    pub async fn extract_as<T: DeserializeOwned>(
        &self,
        instructions: String,
        messages: Vec<Message>,
        format: ResponseFormat,
    ) -> Result<T, RelayError> {
        let object = self.extract(instructions, messages, format).await?;
        serde_json::from_value(Value::Object(object))
            .map_err(|e| RelayError::upstream_format(e.to_string()))
    }
}

/// Command to update search data from a conversation.
#[derive(Debug, Clone)]
pub struct ExtractSearchDataCommand {
    pub messages: Vec<Message>,
    pub current_data: Map<String, Value>,
    /// Raw `searchConfig` from the widget.
    pub search_config: Option<Value>,
}

/// Command to update a customer record from a conversation.
#[derive(Debug, Clone)]
pub struct ExtractCustomerCommand {
    pub messages: Vec<Message>,
    /// `None` when the caller sent no prior state.
    pub current_data: Option<Map<String, Value>>,
}

/// Handler for the three extraction operations.
#[derive(Clone)]
pub struct ExtractionHandler {
    extractor: StructuredExtractor,
    prompts: Arc<PromptBuilder>,
}

impl ExtractionHandler {
    pub fn new(ai_provider: Arc<dyn AIProvider>, prompts: Arc<PromptBuilder>) -> Self {
        Self {
            extractor: StructuredExtractor::new(ai_provider),
            prompts,
        }
    }

    /// Returns the merged search data, shaped by the simplified schema.
    pub async fn search_data(
        &self,
        cmd: ExtractSearchDataCommand,
    ) -> Result<Map<String, Value>, RelayError> {
        let raw = cmd
            .search_config
            .ok_or(RelayError::MissingConfiguration("searchConfig"))?;
        let config = SearchConfig::from_value(&raw)?;
        let schema = simplify(&config);

        tracing::debug!(
            fields = config.fields().len(),
            current_fields = cmd.current_data.len(),
            "Extracting search data"
        );

        let instructions = self.prompts.search_extraction(&config, &cmd.current_data);
        self.extractor
            .extract(
                instructions,
                cmd.messages,
                ResponseFormat::json_schema(SEARCH_DATA_SCHEMA_NAME, schema.to_json_schema()),
            )
            .await
    }

    /// Returns the merged customer intention.
    pub async fn customer_intention(
        &self,
        cmd: ExtractCustomerCommand,
    ) -> Result<CustomerIntention, RelayError> {
        let current = cmd.current_data.unwrap_or_default();
        let instructions = self.prompts.intention_extraction(&current);

        self.extractor
            .extract_as(
                instructions,
                cmd.messages,
                ResponseFormat::json_schema(
                    CustomerIntention::SCHEMA_NAME,
                    CustomerIntention::json_schema(),
                ),
            )
            .await
    }

    /// Returns the customer prospect.
    pub async fn customer_prospect(
        &self,
        cmd: ExtractCustomerCommand,
    ) -> Result<CustomerProspect, RelayError> {
        let instructions = self.prompts.prospect_extraction(cmd.current_data.as_ref());

        self.extractor
            .extract_as(
                instructions,
                cmd.messages,
                ResponseFormat::json_schema(
                    CustomerProspect::SCHEMA_NAME,
                    CustomerProspect::json_schema(),
                ),
            )
            .await
    }
}
