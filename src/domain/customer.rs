//! Structured customer records extracted from the conversation.
//!
//! Every member is optional until the customer states or confirms it. The
//! schemas below are the strict response formats handed to the model; the
//! structs are what the relay deserializes the model's reply into.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How soon the customer wants to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// How the customer feels about what they have seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfactionLevel {
    VeryDissatisfied,
    Dissatisfied,
    Neutral,
    Satisfied,
    VerySatisfied,
}

/// Thematic likes and dislikes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
}

/// What the customer is trying to achieve and how they feel about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerIntention {
    pub objective: Option<String>,
    pub urgency: Option<Urgency>,
    pub pain_points: Option<Vec<String>>,
    pub satisfaction_level: Option<SatisfactionLevel>,
    pub preferences: Option<Preferences>,
    pub priorities: Option<Vec<String>>,
}

impl CustomerIntention {
    /// Name of the response format sent to the provider.
    pub const SCHEMA_NAME: &'static str = "customer_intention";

    /// Strict JSON schema for the intention record.
    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "objective": nullable_string(),
                "urgency": {
                    "type": ["string", "null"],
                    "enum": ["low", "medium", "high", null]
                },
                "painPoints": nullable_string_list(),
                "satisfactionLevel": {
                    "type": ["string", "null"],
                    "enum": ["very_dissatisfied", "dissatisfied", "neutral", "satisfied", "very_satisfied", null]
                },
                "preferences": {
                    "type": ["object", "null"],
                    "properties": {
                        "likes": string_list(),
                        "dislikes": string_list()
                    },
                    "required": ["likes", "dislikes"],
                    "additionalProperties": false
                },
                "priorities": nullable_string_list()
            },
            "required": ["objective", "urgency", "painPoints", "satisfactionLevel", "preferences", "priorities"],
            "additionalProperties": false
        })
    }
}

/// Price bounds the customer mentioned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

/// Concrete details of what the customer is looking for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProspect {
    pub product_type: Option<String>,
    pub price_range: Option<PriceRange>,
    pub specifications: Option<Vec<String>>,
    pub preferences: Option<Vec<String>>,
}

impl CustomerProspect {
    pub const SCHEMA_NAME: &'static str = "customer_prospect";

    pub fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "productType": nullable_string(),
                "priceRange": {
                    "type": ["object", "null"],
                    "properties": {
                        "min": { "type": ["number", "null"] },
                        "max": { "type": ["number", "null"] },
                        "currency": nullable_string()
                    },
                    "required": ["min", "max", "currency"],
                    "additionalProperties": false
                },
                "specifications": nullable_string_list(),
                "preferences": nullable_string_list()
            },
            "required": ["productType", "priceRange", "specifications", "preferences"],
            "additionalProperties": false
        })
    }
}

fn nullable_string() -> Value {
    json!({ "type": ["string", "null"] })
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn nullable_string_list() -> Value {
    json!({ "type": ["array", "null"], "items": { "type": "string" } })
}
