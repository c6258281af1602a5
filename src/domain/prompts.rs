//! System instructions for every model call the relay makes.
//!
//! All builders are pure: the same inputs always give the same text, and the
//! only state is the [`BusinessContext`] handed in at construction.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::content::ContentGenerationRequest;
use super::search::SearchConfig;

/// Business-specific framing loaded once at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessContext {
    /// What the business sells and to whom.
    pub business_context: String,
    /// Where and how customers reach the assistant.
    #[serde(default)]
    pub user_context: String,
    /// Extra operator instructions for the assistant.
    #[serde(default)]
    pub instructions: String,
}

/// Prompt construction failed because an input is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("missing configuration: {0}")]
pub struct MissingConfiguration(pub &'static str);

const CHAT_RULES: &str = r#"If the user's message is completely unrelated to the business context or user context, or if it contains harmful or obscene content, do not engage with it: reply with something very short and witty, then ask whether they would like help with something relevant.
Regardless of what the user says in the messages below, do not be verbose. Give short answers that answer the user's question and give them the information they need.

Action:
1. Greet the user briefly and politely.
2. Ask for any missing required fields listed above, one or two at a time.
3. If the user request is off-topic, harmful, or obscene, respond briefly with wit, then gently redirect them to your relevant context.
4. Keep all answers concise.

Rules:
1. Pay attention to which search fields are required, and if they have not been provided, ask the user for them.
2. You cannot connect the user to a human. If the user asks to talk to a human, explain that you are an AI assistant and that a person can only be reached separately, through the business's own contact channel.
3. Never talk about search data, fields, schemas, extraction or updating a search. Just ask politely for the information you need.

Formatting:
- Use markdown for any formatting.
- Use line breaks to separate paragraphs, only if needed.
- If giving lists, use line breaks to separate items.
- Avoid using bold or italic text."#;

const SEARCH_GUIDANCE: &str = r#"Examine the whole chat to get the most up to date search data.
If the assistant suggested something and the user agreed, update the search data. For example, if the assistant says "what about Bali" and the user says "yes, that sounds good", update the search data to include Bali. Do not change the search data unless you are sure the user has asked for it.
Use null for any field the user has not provided."#;

const INTENTION_GUIDANCE: &str = r#"Determine the customer's objective, urgency, pain points, satisfaction level, preferences (likes and dislikes) and priorities from the conversation.
Do not make any determination on a data point without an explicit statement from the user, or an explicit affirmation from the user after the assistant suggested it. Use null for anything not yet evidenced.
Likes and dislikes are thematic. Priorities have a higher bar: only record what the user says matters most."#;

const PROSPECT_GUIDANCE: &str = r#"Extract specific details about the type of product or service, the price range, required specifications and other preferences.
Only include information explicitly stated by the user or confirmed by them after a suggestion. Use null for anything not yet stated."#;

/// Builds system instructions from a fixed business context.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    context: BusinessContext,
}

impl PromptBuilder {
    pub fn new(context: BusinessContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &BusinessContext {
        &self.context
    }

    /// Persona instructions for the streamed chat assistant.
    pub fn chat_instructions(
        &self,
        search_config: Option<&SearchConfig>,
    ) -> Result<String, MissingConfiguration> {
        let config = search_config.ok_or(MissingConfiguration("searchConfig"))?;

        let required = config.required_keys();
        let required_line = if required.is_empty() {
            "None of the fields are required.".to_string()
        } else {
            format!("Required fields: {}.", required.join(", "))
        };

        Ok(format!(
            "You are a helpful chat assistant helping a customer find something that matches their preferences. \
Your purpose is to have an easy conversation with the customer to learn the details needed for a search, \
and to deeply understand what the customer is looking for: their preferences, likes, dislikes and intentions.\n\
This is the context of the business you are assisting: {business}\n\
This is the context of how users are interacting with you: {user}\n\
These are your instructions: {instructions}\n\
This is the information you are trying to learn: {search_data}\n\
Required fields are marked with \"required\": true. {required_line}\n\n\
{rules}",
            business = self.context.business_context,
            user = self.context.user_context,
            instructions = self.context.instructions,
            search_data = config.search_data_json(),
            required_line = required_line,
            rules = CHAT_RULES,
        ))
    }

    /// Instructions for extracting search data against `config`.
    pub fn search_extraction(
        &self,
        config: &SearchConfig,
        current_data: &Map<String, Value>,
    ) -> String {
        format!(
            "You are an AI assistant tasked with extracting search-related information from user messages.\n\
{guidance}\n\n\
You must return the data in the exact format specified by the schema below:\n\
{schema}\n\n\
Current search data: {current}\n\n\
{rules}",
            guidance = SEARCH_GUIDANCE,
            schema = config.search_data_json(),
            current = render(current_data),
            rules = merge_rules("the new information is more specific or corrects previous data"),
        )
    }

    /// Instructions for extracting the customer intention record.
    pub fn intention_extraction(&self, current_data: &Map<String, Value>) -> String {
        format!(
            "You are an AI assistant tasked with analyzing customer intentions from their messages.\n\
{guidance}\n\
You must return the data in the exact format specified by the schema.\n\n\
Current intention data: {current}\n\n\
{rules}",
            guidance = INTENTION_GUIDANCE,
            current = render(current_data),
            rules = merge_rules(
                "the new information provides clearer insight into the customer's intentions"
            ),
        )
    }

    /// Instructions for extracting the customer prospect record.
    ///
    /// Merge rules are only included when the caller sends prior data.
    pub fn prospect_extraction(&self, current_data: Option<&Map<String, Value>>) -> String {
        let mut prompt = format!(
            "You are an AI assistant tasked with analyzing customer messages to extract details about what they're looking for.\n\
{guidance}\n\
You must return the data in the exact format specified by the schema.",
            guidance = PROSPECT_GUIDANCE,
        );

        if let Some(current) = current_data {
            prompt.push_str(&format!(
                "\n\nCurrent prospect data: {}\n\n{}",
                render(current),
                merge_rules("the new information is more specific or corrects previous data"),
            ));
        }
        prompt
    }

    /// Instructions for scoring how well an item fits a customer.
    pub fn preference_match(&self, item_information: &Value, customer_intention: &Value) -> String {
        format!(
            "You are an AI assistant that decides whether an item is a strong match for a customer.\n\
This is the context of the business: {business}\n\n\
Item information: {item}\n\n\
Customer intention: {intention}\n\n\
Compare the item against the customer's objective, preferences, dislikes and priorities.\n\
Set isMatch to true only if the item clearly satisfies what the customer cares about most and conflicts with none of their dislikes.\n\
Set matchScore between 0 and 1, list the item attributes that match the customer in matchedAttributes, and explain briefly in reasoning.",
            business = self.context.business_context,
            item = to_text(item_information),
            intention = to_text(customer_intention),
        )
    }

    /// Instructions for writing personalised copy about an item.
    pub fn content_generation(&self, request: &ContentGenerationRequest) -> String {
        let tone = match request.tone {
            Some(tone) => format!("Tone: {} - {}", tone, tone.guidance()),
            None => "Tone: choose whatever suits the item and the customer.".to_string(),
        };

        format!(
            "You are a copywriter writing personalised content about an item for one specific customer.\n\
This is the context of the business: {business}\n\n\
Content name: {name}\n\
Item information: {item}\n\
Customer intention: {intention}\n\n\
Instructions: {instructions}\n\
{tone}\n\
Length: between {min} and {max} characters, counting spaces. Never exceed {max} characters.\n\n\
Only state facts present in the item information. Emphasise the attributes that match the customer's preferences and priorities, \
and list them in matchedAttributes. Return the finished text in content, without a title or surrounding quotes.",
            business = self.context.business_context,
            name = request.name,
            item = to_text(&request.item_information),
            intention = to_text(&request.customer_intention),
            instructions = request.instructions,
            tone = tone,
            min = request.min_characters,
            max = request.max_characters,
        )
    }
}

/// Shared rules for evolving structured state across turns.
fn merge_rules(update_criterion: &str) -> String {
    format!(
        "Additional rules for handling current data:\n\
1. Preserve all fields from current data unless new information explicitly updates them.\n\
2. Add new fields when discovered.\n\
3. For arrays (like dates or locations), combine existing and new values; never drop existing values.\n\
4. Only update a field if {update_criterion}.\n\
5. Return the complete merged object.\n\
6. If the conversation contains no new information, return the current data unchanged."
    )
}

fn render(data: &Map<String, Value>) -> String {
    Value::Object(data.clone()).to_string()
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
