//! Checks a model reply against the schema it was constrained with.
//!
//! Supports the subset of JSON Schema the relay itself emits: `type`
//! (single or list), `enum`, `items`, `properties`, `required` and
//! `additionalProperties: false`.

use serde_json::Value;
use thiserror::Error;

/// A value that does not match its schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("at {path}: {reason}")]
pub struct ConformanceError {
    pub path: String,
    pub reason: String,
}

impl ConformanceError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validates `value` against `schema`.
pub fn check(value: &Value, schema: &Value) -> Result<(), ConformanceError> {
    check_at("$", value, schema)
}

fn check_at(path: &str, value: &Value, schema: &Value) -> Result<(), ConformanceError> {
    if let Some(expected) = schema.get("type") {
        let allowed: Vec<&str> = match expected {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if !allowed.iter().any(|name| matches_type(value, name)) {
            return Err(ConformanceError::new(
                path,
                format!("expected {}, got {}", allowed.join(" or "), type_of(value)),
            ));
        }
    }

    if let Some(Value::Array(choices)) = schema.get("enum") {
        if !choices.contains(value) {
            return Err(ConformanceError::new(path, format!("{} is not an allowed value", value)));
        }
    }

    match value {
        Value::Object(object) => {
            let properties = schema.get("properties").and_then(Value::as_object);

            if let Some(Value::Array(required)) = schema.get("required") {
                for key in required.iter().filter_map(Value::as_str) {
                    if !object.contains_key(key) {
                        return Err(ConformanceError::new(path, format!("missing field '{}'", key)));
                    }
                }
            }

            let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
            for (key, member) in object {
                match properties.and_then(|p| p.get(key)) {
                    Some(member_schema) => {
                        check_at(&format!("{}.{}", path, key), member, member_schema)?
                    }
                    None if closed => {
                        let reason = format!("unexpected field '{}'", key);
                        return Err(ConformanceError::new(path, reason));
                    }
                    None => {}
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (index, item) in items.iter().enumerate() {
                    check_at(&format!("{}[{}]", path, index), item, item_schema)?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}

fn matches_type(value: &Value, name: &str) -> bool {
    match name {
        "null" => value.is_null(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|n| n.fract() == 0.0)
        }
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => false,
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
