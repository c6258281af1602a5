//! User message moderation.

use std::sync::Arc;

use crate::domain::moderation::ModerationVerdict;
use crate::ports::ContentModerator;

use super::error::RelayError;

/// Command to classify one user message.
#[derive(Debug, Clone)]
pub struct ModerateMessageCommand {
    pub content: Option<String>,
}

/// Handler for message moderation.
#[derive(Clone)]
pub struct ModerateMessageHandler {
    moderator: Arc<dyn ContentModerator>,
}

impl ModerateMessageHandler {
    pub fn new(moderator: Arc<dyn ContentModerator>) -> Self {
        Self { moderator }
    }

    pub async fn handle(
        &self,
        cmd: ModerateMessageCommand,
    ) -> Result<ModerationVerdict, RelayError> {
        let content = cmd
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| RelayError::validation("content is required"))?;

        let classification = self.moderator.classify(&content).await?;
        if classification.flagged {
            tracing::info!(
                categories = ?classification
                    .categories
                    .iter()
                    .filter(|(_, hit)| **hit)
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>(),
                "Message flagged by moderation"
            );
        }

        Ok(ModerationVerdict::from_classification(
            classification.flagged,
            classification.categories,
        ))
    }
}
