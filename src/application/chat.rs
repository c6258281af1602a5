//! Streamed chat replies.

use std::pin::Pin;
use std::sync::Arc;

use futures::{future, Stream, StreamExt};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::prompts::PromptBuilder;
use crate::domain::search::SearchConfig;
use crate::ports::{AIError, AIProvider, CompletionRequest, Message};

use super::error::RelayError;

/// Reply text fragments in arrival order.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, AIError>> + Send>>;

/// Command to continue a chat conversation.
#[derive(Debug, Clone)]
pub struct StreamChatCommand {
    pub messages: Vec<Message>,
    /// Raw `searchConfig` from the widget.
    pub search_config: Option<Value>,
}

/// Handler producing the assistant's next reply as a stream.
#[derive(Clone)]
pub struct StreamChatHandler {
    ai_provider: Arc<dyn AIProvider>,
    prompts: Arc<PromptBuilder>,
}

impl StreamChatHandler {
    pub fn new(ai_provider: Arc<dyn AIProvider>, prompts: Arc<PromptBuilder>) -> Self {
        Self {
            ai_provider,
            prompts,
        }
    }

    /// Opens the upstream stream and yields only non-empty text.
    ///
    /// Errors before the first fragment are returned directly; errors after
    /// that arrive through the stream and end it.
    pub async fn handle(&self, cmd: StreamChatCommand) -> Result<ReplyStream, RelayError> {
        let config = cmd
            .search_config
            .as_ref()
            .map(SearchConfig::from_value)
            .transpose()?;
        let instructions = self.prompts.chat_instructions(config.as_ref())?;

        let request = CompletionRequest::new()
            .with_system_prompt(instructions)
            .with_messages(cmd.messages)
            .with_trace_id(Uuid::new_v4().to_string());

        let upstream = self.ai_provider.stream_complete(request).await?;

        let fragments = upstream
            .filter_map(|chunk| {
                future::ready(match chunk {
                    Ok(chunk) if chunk.delta.is_empty() => None,
                    Ok(chunk) => Some(Ok(chunk.delta)),
                    Err(e) => Some(Err(e)),
                })
            })
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                *failed = item.is_err();
                future::ready(Some(item))
            });

        Ok(Box::pin(fragments))
    }
}
