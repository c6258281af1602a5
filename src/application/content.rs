//! Personalised content generation with an optional preference gate.

use std::sync::Arc;

use crate::domain::content::{
    trim_to_max_chars, ContentRequestValidator, ContentResult, GeneratedContent, PreferenceMatch,
    RawContentRequest,
};
use crate::domain::prompts::PromptBuilder;
use crate::ports::{AIProvider, Message, ResponseFormat};

use super::error::RelayError;
use super::extraction::StructuredExtractor;

/// Minimum match score for content to be written under a strong-match request.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

/// Handler for the custom content operation.
#[derive(Clone)]
pub struct ContentGenerator {
    extractor: StructuredExtractor,
    prompts: Arc<PromptBuilder>,
    validator: ContentRequestValidator,
    match_threshold: f64,
}

impl ContentGenerator {
    pub fn new(ai_provider: Arc<dyn AIProvider>, prompts: Arc<PromptBuilder>) -> Self {
        Self {
            extractor: StructuredExtractor::new(ai_provider),
            prompts,
            validator: ContentRequestValidator,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Validates the request, checks the match when asked to, then writes.
    ///
    /// An item that fails the match check yields a result with no content
    /// and no generation call.
    pub async fn generate(&self, raw: RawContentRequest) -> Result<ContentResult, RelayError> {
        let request = self.validator.validate(raw)?;

        let match_score = if request.require_strong_match {
            let verdict: PreferenceMatch = self
                .extractor
                .extract_as(
                    self.prompts
                        .preference_match(&request.item_information, &request.customer_intention),
                    vec![Message::user("Evaluate the match.")],
                    ResponseFormat::json_schema(
                        PreferenceMatch::SCHEMA_NAME,
                        PreferenceMatch::json_schema(),
                    ),
                )
                .await?;

            if !verdict.passes(self.match_threshold) {
                tracing::info!(
                    name = %request.name,
                    score = verdict.match_score,
                    threshold = self.match_threshold,
                    "Item is not a strong match, skipping generation"
                );
                return Ok(ContentResult::not_matching(verdict));
            }
            Some(verdict.match_score)
        } else {
            None
        };

        let generated: GeneratedContent = self
            .extractor
            .extract_as(
                self.prompts.content_generation(&request),
                vec![Message::user("Write the content.")],
                ResponseFormat::json_schema(
                    GeneratedContent::SCHEMA_NAME,
                    GeneratedContent::json_schema(),
                ),
            )
            .await?;

        let content = trim_to_max_chars(&generated.content, request.max_characters as usize);
        let character_count = content.chars().count();
        if character_count < request.min_characters as usize {
            tracing::debug!(
                name = %request.name,
                character_count,
                min = request.min_characters,
                "Generated content is shorter than requested"
            );
        }

        Ok(ContentResult {
            content: Some(content),
            is_match: true,
            match_score,
            matched_attributes: generated.matched_attributes,
            tone: request.tone,
            character_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::content::Tone;
    use crate::domain::prompts::BusinessContext;
    use serde_json::json;

    fn generator(provider: &MockAIProvider) -> ContentGenerator {
        ContentGenerator::new(
            Arc::new(provider.clone()),
            Arc::new(PromptBuilder::new(BusinessContext::default())),
        )
    }

    fn raw(require_strong_match: bool) -> RawContentRequest {
        RawContentRequest {
            item_information: Some(json!({ "title": "Seaside villa", "pool": true })),
            customer_intention: Some(json!({ "preferences": { "likes": ["beach"] } })),
            name: Some("teaser".to_string()),
            instructions: Some("Short teaser for the listing".to_string()),
            min_characters: Some(10),
            max_characters: Some(40),
            tone: Some("fun".to_string()),
            require_strong_match: Some(require_strong_match),
        }
    }

    fn verdict(is_match: bool, score: f64) -> serde_json::Value {
        json!({
            "isMatch": is_match,
            "matchScore": score,
            "matchedAttributes": ["beach"],
            "reasoning": "Seafront location"
        })
    }

    #[tokio::test]
    async fn generates_without_match_check() {
        let provider = MockAIProvider::new().with_json_response(json!({
            "content": "Wake up to the waves!",
            "matchedAttributes": ["beach"]
        }));

        let result = generator(&provider).generate(raw(false)).await.unwrap();

        assert_eq!(result.content.as_deref(), Some("Wake up to the waves!"));
        assert!(result.is_match);
        assert_eq!(result.match_score, None);
        assert_eq!(result.tone, Some(Tone::Fun));
        assert_eq!(result.character_count, 21);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(
            provider.get_calls()[0].response_format.as_ref().unwrap().name,
            GeneratedContent::SCHEMA_NAME
        );
    }

    #[tokio::test]
    async fn overlong_content_is_trimmed() {
        let provider = MockAIProvider::new().with_json_response(json!({
            "content": "Wake up to the waves in this bright seaside villa with a pool",
            "matchedAttributes": []
        }));

        let result = generator(&provider).generate(raw(false)).await.unwrap();

        let content = result.content.unwrap();
        assert!(content.chars().count() <= 40);
        assert_eq!(result.character_count, content.chars().count());
        assert!(!content.ends_with(' '));
    }

    #[tokio::test]
    async fn weak_match_skips_generation() {
        let provider = MockAIProvider::new().with_json_response(verdict(true, 0.4));

        let result = generator(&provider).generate(raw(true)).await.unwrap();

        assert_eq!(result.content, None);
        assert!(!result.is_match);
        assert_eq!(result.match_score, Some(0.4));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn strong_match_then_generates() {
        let provider = MockAIProvider::new()
            .with_json_response(verdict(true, 0.9))
            .with_json_response(json!({
                "content": "Sand between your toes",
                "matchedAttributes": ["beach"]
            }));

        let result = generator(&provider).generate(raw(true)).await.unwrap();

        assert!(result.is_match);
        assert_eq!(result.match_score, Some(0.9));
        assert_eq!(result.content.as_deref(), Some("Sand between your toes"));

        let calls = provider.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].response_format.as_ref().unwrap().name,
            PreferenceMatch::SCHEMA_NAME
        );
    }

    #[tokio::test]
    async fn threshold_is_configurable() {
        let provider = MockAIProvider::new().with_json_response(verdict(true, 0.8));

        let result = generator(&provider)
            .with_match_threshold(0.85)
            .generate(raw(true))
            .await
            .unwrap();

        assert!(!result.is_match);
    }

    #[tokio::test]
    async fn invalid_request_makes_no_call() {
        let provider = MockAIProvider::new();
        let request = RawContentRequest {
            tone: Some("grim".to_string()),
            ..raw(false)
        };

        let err = generator(&provider).generate(request).await.unwrap_err();

        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(provider.call_count(), 0);
    }
}
