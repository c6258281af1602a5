//! Custom content generation: request validation and result types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Voice of the generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Neutral,
    Factual,
    Fun,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Positive, Tone::Neutral, Tone::Factual, Tone::Fun];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Positive => "positive",
            Tone::Neutral => "neutral",
            Tone::Factual => "factual",
            Tone::Fun => "fun",
        }
    }

    /// Writing guidance included in the generation prompt.
    pub fn guidance(&self) -> &'static str {
        match self {
            Tone::Positive => "Warm and enthusiastic, highlighting what the customer will love.",
            Tone::Neutral => "Balanced and calm, neither selling hard nor understating.",
            Tone::Factual => "Plain and precise, stating concrete facts without embellishment.",
            Tone::Fun => "Playful and light-hearted, with a touch of humour.",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ContentRejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str() == s)
            .ok_or_else(|| ContentRejection::InvalidTone(s.to_string()))
    }
}

/// Content generation request exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContentRequest {
    pub item_information: Option<Value>,
    pub customer_intention: Option<Value>,
    pub name: Option<String>,
    pub instructions: Option<String>,
    pub min_characters: Option<u32>,
    pub max_characters: Option<u32>,
    pub tone: Option<String>,
    pub require_strong_match: Option<bool>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentGenerationRequest {
    pub item_information: Value,
    pub customer_intention: Value,
    pub name: String,
    pub instructions: String,
    pub min_characters: u32,
    pub max_characters: u32,
    pub tone: Option<Tone>,
    pub require_strong_match: bool,
}

/// Why a content request was refused before any model call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentRejection {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid tone specified: {0}")]
    InvalidTone(String),

    #[error("minCharacters ({min}) must not exceed maxCharacters ({max})")]
    InvalidBounds { min: u32, max: u32 },
}

/// Single place where content requests are checked.
///
/// Empty strings, zero and `null` count as missing, which is how the widget
/// signals an unset field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRequestValidator;

impl ContentRequestValidator {
    pub fn validate(
        &self,
        raw: RawContentRequest,
    ) -> Result<ContentGenerationRequest, ContentRejection> {
        let mut missing = Vec::new();

        let item_information = present_value(raw.item_information);
        if item_information.is_none() {
            missing.push("itemInformation");
        }
        let customer_intention = present_value(raw.customer_intention);
        if customer_intention.is_none() {
            missing.push("customerIntention");
        }
        let name = present_text(raw.name);
        if name.is_none() {
            missing.push("name");
        }
        let instructions = present_text(raw.instructions);
        if instructions.is_none() {
            missing.push("instructions");
        }
        let min_characters = raw.min_characters.filter(|n| *n > 0);
        if min_characters.is_none() {
            missing.push("minCharacters");
        }
        let max_characters = raw.max_characters.filter(|n| *n > 0);
        if max_characters.is_none() {
            missing.push("maxCharacters");
        }

        let (
            Some(item_information),
            Some(customer_intention),
            Some(name),
            Some(instructions),
            Some(min_characters),
            Some(max_characters),
        ) = (
            item_information,
            customer_intention,
            name,
            instructions,
            min_characters,
            max_characters,
        )
        else {
            return Err(ContentRejection::MissingFields(missing));
        };

        let tone = match present_text(raw.tone) {
            Some(tone) => Some(tone.parse::<Tone>()?),
            None => None,
        };

        if min_characters > max_characters {
            return Err(ContentRejection::InvalidBounds {
                min: min_characters,
                max: max_characters,
            });
        }

        Ok(ContentGenerationRequest {
            item_information,
            customer_intention,
            name,
            instructions,
            min_characters,
            max_characters,
            tone,
            require_strong_match: raw.require_strong_match.unwrap_or(false),
        })
    }
}

fn present_text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn present_value(value: Option<Value>) -> Option<Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Bool(b) => *b,
        _ => true,
    })
}

/// Verdict of the preference-match check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceMatch {
    pub is_match: bool,
    pub match_score: f64,
    pub matched_attributes: Vec<String>,
    pub reasoning: String,
}

impl PreferenceMatch {
    pub const SCHEMA_NAME: &'static str = "preference_match";

    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "isMatch": { "type": "boolean" },
                "matchScore": { "type": "number" },
                "matchedAttributes": { "type": "array", "items": { "type": "string" } },
                "reasoning": { "type": "string" }
            },
            "required": ["isMatch", "matchScore", "matchedAttributes", "reasoning"],
            "additionalProperties": false
        })
    }

    /// True when the model agrees and the score clears `threshold`.
    pub fn passes(&self, threshold: f64) -> bool {
        self.is_match && self.match_score >= threshold
    }
}

/// Copy returned by the generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub content: String,
    pub matched_attributes: Vec<String>,
}

impl GeneratedContent {
    pub const SCHEMA_NAME: &'static str = "generated_content";

    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string" },
                "matchedAttributes": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["content", "matchedAttributes"],
            "additionalProperties": false
        })
    }
}

/// Response body of the content endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResult {
    /// `None` when the item did not match the customer's preferences.
    pub content: Option<String>,
    pub is_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    pub matched_attributes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    pub character_count: usize,
}

impl ContentResult {
    /// Result for an item that failed the preference check.
    pub fn not_matching(verdict: PreferenceMatch) -> Self {
        Self {
            content: None,
            is_match: false,
            match_score: Some(verdict.match_score),
            matched_attributes: verdict.matched_attributes,
            tone: None,
            character_count: 0,
        }
    }
}

/// Cuts `text` to at most `max` characters, preferring a word boundary.
pub fn trim_to_max_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }

    let cut: String = text.chars().take(max).collect();
    if text.chars().nth(max).is_some_and(char::is_whitespace) {
        return cut.trim_end().to_string();
    }
    match cut.rfind(char::is_whitespace) {
        Some(boundary) if boundary > 0 => cut[..boundary].trim_end().to_string(),
        _ => cut,
    }
}
