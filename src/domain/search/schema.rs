//! Flattens a search configuration into the JSON schema used for
//! constrained generation.
//!
//! Strict structured output requires every property to be listed in
//! `required`. Optional fields are therefore expressed as nullable types
//! rather than by leaving them out.

use serde_json::{json, Map, Value};

use super::config::{FieldType, SearchConfig};

/// Property descriptors plus the required-key list for one extraction call.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifiedSchema {
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl SimplifiedSchema {
    /// Renders the object schema sent as the response format.
    pub fn to_json_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": Value::Object(self.properties.clone()),
            "required": self.required,
            "additionalProperties": false,
        })
    }
}

/// Builds the simplified schema for a parsed configuration.
pub fn simplify(config: &SearchConfig) -> SimplifiedSchema {
    let mut properties = Map::new();
    let mut required = Vec::with_capacity(config.fields().len());

    for field in config.fields() {
        properties.insert(field.key.clone(), descriptor(&field.kind, true));
        required.push(field.key.clone());
    }

    SimplifiedSchema {
        properties,
        required,
    }
}

fn descriptor(kind: &FieldType, nullable: bool) -> Value {
    match kind {
        FieldType::String => json!({ "type": type_name("string", nullable) }),
        FieldType::Number => json!({ "type": type_name("number", nullable) }),
        FieldType::Integer => json!({ "type": type_name("integer", nullable) }),
        FieldType::Boolean => json!({ "type": type_name("boolean", nullable) }),
        FieldType::Date => json!({
            "type": type_name("string", nullable),
            "description": "ISO 8601 date (YYYY-MM-DD)",
        }),
        FieldType::Enum(values) => {
            let mut allowed: Vec<Value> = values.iter().map(|v| json!(v)).collect();
            if nullable {
                allowed.push(Value::Null);
            }
            json!({ "type": type_name("string", nullable), "enum": allowed })
        }
        FieldType::Array(items) => json!({
            "type": type_name("array", nullable),
            "items": descriptor(items, false),
        }),
    }
}

fn type_name(name: &str, nullable: bool) -> Value {
    if nullable {
        json!([name, "null"])
    } else {
        json!(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn config(value: Value) -> SearchConfig {
        SearchConfig::from_value(&value).unwrap()
    }

    #[test]
    fn optional_fields_are_still_required_but_nullable() {
        let schema = simplify(&config(json!({
            "searchData": {
                "destination": { "type": "string", "required": true },
                "budget": { "type": "number" }
            }
        })));

        assert_eq!(schema.required, vec!["destination", "budget"]);
        assert_eq!(schema.properties["budget"], json!({ "type": ["number", "null"] }));
    }

    #[test]
    fn enum_values_include_null() {
        let schema = simplify(&config(json!({
            "searchData": { "style": { "type": "enum", "values": ["beach", "city"] } }
        })));

        assert_eq!(
            schema.properties["style"],
            json!({ "type": ["string", "null"], "enum": ["beach", "city", null] })
        );
    }

    #[test]
    fn arrays_wrap_a_non_nullable_element_type() {
        let schema = simplify(&config(json!({
            "searchData": {
                "dates": { "type": "array", "items": { "type": "date" } },
                "grid": { "type": "array", "items": { "type": "array", "items": { "type": "integer" } } }
            }
        })));

        assert_eq!(
            schema.properties["dates"],
            json!({
                "type": ["array", "null"],
                "items": { "type": "string", "description": "ISO 8601 date (YYYY-MM-DD)" }
            })
        );
        assert_eq!(
            schema.properties["grid"],
            json!({
                "type": ["array", "null"],
                "items": { "type": "array", "items": { "type": "integer" } }
            })
        );
    }

    #[test]
    fn json_schema_forbids_additional_properties() {
        let schema = simplify(&config(json!({
            "searchData": { "city": { "type": "string" } }
        })));

        let rendered = schema.to_json_schema();
        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["additionalProperties"], false);
        assert_eq!(rendered["required"], json!(["city"]));
    }

    #[test]
    fn empty_search_data_gives_empty_schema() {
        let schema = simplify(&config(json!({ "searchData": {} })));
        assert!(schema.properties.is_empty());
        assert!(schema.required.is_empty());
    }

    fn field_type() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(json!({ "type": "string" })),
            Just(json!({ "type": "number" })),
            Just(json!({ "type": "integer" })),
            Just(json!({ "type": "boolean" })),
            Just(json!({ "type": "date" })),
            Just(json!({ "type": "enum", "values": ["a", "b"] })),
        ];
        leaf.prop_recursive(3, 8, 1, |inner| {
            inner.prop_map(|items| json!({ "type": "array", "items": items }))
        })
    }

    proptest! {
        #[test]
        fn required_keys_equal_property_keys_equal_field_keys(
            fields in prop::collection::btree_map("[a-z][a-zA-Z0-9]{0,8}", (field_type(), any::<bool>()), 0..12)
        ) {
            let mut search_data = Map::new();
            for (key, (mut definition, required)) in fields.clone() {
                definition["required"] = json!(required);
                search_data.insert(key, definition);
            }
            let parsed = config(json!({ "searchData": search_data }));
            let schema = simplify(&parsed);

            let all_keys: BTreeSet<String> = fields.keys().cloned().collect();
            let property_keys: BTreeSet<String> = schema.properties.keys().cloned().collect();
            let required_keys: BTreeSet<String> = schema.required.iter().cloned().collect();

            prop_assert_eq!(&property_keys, &all_keys);
            prop_assert_eq!(&required_keys, &all_keys);
            prop_assert_eq!(schema.required.len(), fields.len());
        }
    }
}
