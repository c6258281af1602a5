//! Search configuration supplied by the widget.
//!
//! The widget sends its configuration as
//!
//! ```json
//! {
//!   "name": "holidays",
//!   "searchData": {
//!     "destination": { "type": "string", "required": true, "description": "Where to go" },
//!     "travelDates": { "type": "array", "items": { "type": "date" } },
//!     "style": { "type": "enum", "values": ["beach", "city", "ski"] }
//!   }
//! }
//! ```
//!
//! Field order is significant and preserved. Members other than `type`,
//! `required`, `description`, `values` and `items` are descriptive metadata
//! that is forwarded to the model untouched.

use serde_json::{Map, Value};

use super::error::ConfigurationError;

/// Value type of a search field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Enum(Vec<String>),
    Array(Box<FieldType>),
}

/// One field the assistant should extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub key: String,
    pub kind: FieldType,
    pub required: bool,
    pub description: Option<String>,
}

/// A parsed, validated search configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    name: Option<String>,
    fields: Vec<FieldDefinition>,
    search_data: Map<String, Value>,
}

impl SearchConfig {
    /// Parses a raw `searchConfig` value, failing on the first bad field.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        let object = value.as_object().ok_or(ConfigurationError::NotAnObject)?;

        let search_data = object
            .get("searchData")
            .and_then(Value::as_object)
            .ok_or(ConfigurationError::MissingSearchData)?;

        let fields = search_data
            .iter()
            .map(|(key, definition)| parse_field(key, definition))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: object.get("name").and_then(Value::as_str).map(String::from),
            fields,
            search_data: search_data.clone(),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Field definitions in configuration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Every field key, in configuration order.
    pub fn field_keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }

    /// Keys of fields marked `required: true`.
    pub fn required_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.key.as_str())
            .collect()
    }

    /// The `searchData` object exactly as the widget sent it.
    pub fn search_data_json(&self) -> String {
        Value::Object(self.search_data.clone()).to_string()
    }
}

fn parse_field(key: &str, definition: &Value) -> Result<FieldDefinition, ConfigurationError> {
    let object = definition
        .as_object()
        .ok_or_else(|| ConfigurationError::field_not_object(key))?;

    Ok(FieldDefinition {
        key: key.to_string(),
        kind: parse_type(key, object)?,
        required: object
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        description: object
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

fn parse_type(key: &str, object: &Map<String, Value>) -> Result<FieldType, ConfigurationError> {
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigurationError::missing_type(key))?;

    match kind.to_ascii_lowercase().as_str() {
        "string" | "text" => Ok(FieldType::String),
        "number" => Ok(FieldType::Number),
        "integer" => Ok(FieldType::Integer),
        "boolean" => Ok(FieldType::Boolean),
        "date" => Ok(FieldType::Date),
        "enum" => {
            let values: Vec<String> = object
                .get("values")
                .and_then(Value::as_array)
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();

            if values.is_empty() {
                return Err(ConfigurationError::EnumWithoutValues {
                    field: key.to_string(),
                });
            }
            Ok(FieldType::Enum(values))
        }
        "array" | "list" => {
            let items = object
                .get("items")
                .and_then(Value::as_object)
                .ok_or_else(|| ConfigurationError::ArrayWithoutItems {
                    field: key.to_string(),
                })?;
            Ok(FieldType::Array(Box::new(parse_type(key, items)?)))
        }
        _ => Err(ConfigurationError::unrecognized(key, kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn holiday_config() -> Value {
        json!({
            "name": "holidays",
            "searchData": {
                "destination": { "type": "string", "required": true, "description": "Where to" },
                "travelDates": { "type": "array", "items": { "type": "date" } },
                "budget": { "type": "number" },
                "style": { "type": "enum", "values": ["beach", "city"], "required": true }
            }
        })
    }

    #[test]
    fn parses_fields_in_order() {
        let config = SearchConfig::from_value(&holiday_config()).unwrap();

        assert_eq!(config.name(), Some("holidays"));
        assert_eq!(
            config.field_keys(),
            vec!["destination", "travelDates", "budget", "style"]
        );
        assert_eq!(config.fields()[1].kind, FieldType::Array(Box::new(FieldType::Date)));
        assert_eq!(
            config.fields()[3].kind,
            FieldType::Enum(vec!["beach".to_string(), "city".to_string()])
        );
    }

    #[test]
    fn required_keys_only_lists_required_fields() {
        let config = SearchConfig::from_value(&holiday_config()).unwrap();
        assert_eq!(config.required_keys(), vec!["destination", "style"]);
    }

    #[test]
    fn list_is_an_alias_for_array() {
        let config = SearchConfig::from_value(&json!({
            "searchData": { "tags": { "type": "list", "items": { "type": "string" } } }
        }))
        .unwrap();
        assert_eq!(
            config.fields()[0].kind,
            FieldType::Array(Box::new(FieldType::String))
        );
    }

    #[test]
    fn nested_arrays_keep_their_depth() {
        let config = SearchConfig::from_value(&json!({
            "searchData": {
                "grid": { "type": "array", "items": { "type": "array", "items": { "type": "integer" } } }
            }
        }))
        .unwrap();
        assert_eq!(
            config.fields()[0].kind,
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Integer))))
        );
    }

    #[test]
    fn missing_type_fails_fast() {
        let err = SearchConfig::from_value(&json!({
            "searchData": { "destination": { "required": true } }
        }))
        .unwrap_err();
        assert_eq!(err, ConfigurationError::missing_type("destination"));
    }

    #[test]
    fn unknown_type_fails_fast() {
        let err = SearchConfig::from_value(&json!({
            "searchData": { "budget": { "type": "money" } }
        }))
        .unwrap_err();
        assert_eq!(err, ConfigurationError::unrecognized("budget", "money"));
    }

    #[test]
    fn enum_without_values_is_rejected() {
        let err = SearchConfig::from_value(&json!({
            "searchData": { "style": { "type": "enum" } }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::EnumWithoutValues { .. }));
    }

    #[test]
    fn array_without_items_is_rejected() {
        let err = SearchConfig::from_value(&json!({
            "searchData": { "dates": { "type": "array" } }
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::ArrayWithoutItems { .. }));
    }

    #[test]
    fn missing_search_data_is_rejected() {
        let err = SearchConfig::from_value(&json!({ "name": "empty" })).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingSearchData);
    }

    #[test]
    fn search_data_json_keeps_metadata() {
        let config = SearchConfig::from_value(&json!({
            "searchData": { "city": { "type": "string", "example": "Lisbon" } }
        }))
        .unwrap();
        assert_eq!(
            config.search_data_json(),
            r#"{"city":{"type":"string","example":"Lisbon"}}"#
        );
    }
}
