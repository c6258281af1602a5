//! Moderation port - classifies user text against the provider's policy.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::AIError;

/// Port for content moderation.
#[async_trait]
pub trait ContentModerator: Send + Sync {
    /// Classify one piece of text.
    async fn classify(&self, text: &str) -> Result<ModerationClassification, AIError>;
}

/// Raw classifier output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationClassification {
    /// Whether any category was triggered.
    pub flagged: bool,
    /// Every category the classifier reports, triggered or not.
    pub categories: BTreeMap<String, bool>,
}

impl ModerationClassification {
    /// A clean result with no categories.
    pub fn clean() -> Self {
        Self::default()
    }

    /// A flagged result for the given categories.
    pub fn flagged<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flagged: true,
            categories: categories.into_iter().map(|c| (c.into(), true)).collect(),
        }
    }
}
