//! Moderation verdict returned to the widget.

use std::collections::BTreeMap;

use serde::Serialize;

/// Whether a message was flagged, with the categories that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModerationVerdict {
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<BTreeMap<String, bool>>,
}

impl ModerationVerdict {
    /// Narrows a classifier result: categories are kept only when flagged.
    pub fn from_classification(flagged: bool, categories: BTreeMap<String, bool>) -> Self {
        Self {
            flagged,
            categories: flagged.then_some(categories),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn categories() -> BTreeMap<String, bool> {
        BTreeMap::from([
            ("harassment".to_string(), true),
            ("violence".to_string(), false),
        ])
    }

    #[test]
    fn unflagged_verdict_omits_categories() {
        let verdict = ModerationVerdict::from_classification(false, categories());
        assert_eq!(verdict.categories, None);
        assert_eq!(serde_json::to_value(&verdict).unwrap(), json!({ "flagged": false }));
    }

    #[test]
    fn flagged_verdict_keeps_categories() {
        let verdict = ModerationVerdict::from_classification(true, categories());
        assert_eq!(
            serde_json::to_value(&verdict).unwrap(),
            json!({ "flagged": true, "categories": { "harassment": true, "violence": false } })
        );
    }
}
