//! Errors raised while interpreting a caller-supplied search configuration.

use thiserror::Error;

/// A search configuration that cannot be turned into an extraction schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("searchConfig must contain a searchData object")]
    MissingSearchData,

    #[error("searchConfig must be a JSON object")]
    NotAnObject,

    #[error("field '{field}' must be an object")]
    FieldNotObject { field: String },

    #[error("field '{field}' has no type")]
    MissingFieldType { field: String },

    #[error("field '{field}' has unrecognized type '{kind}'")]
    UnrecognizedFieldType { field: String, kind: String },

    #[error("enum field '{field}' must list at least one string value")]
    EnumWithoutValues { field: String },

    #[error("array field '{field}' must describe its items")]
    ArrayWithoutItems { field: String },
}

impl ConfigurationError {
    pub(crate) fn field_not_object(field: &str) -> Self {
        Self::FieldNotObject {
            field: field.to_string(),
        }
    }

    pub(crate) fn missing_type(field: &str) -> Self {
        Self::MissingFieldType {
            field: field.to_string(),
        }
    }

    pub(crate) fn unrecognized(field: &str, kind: &str) -> Self {
        Self::UnrecognizedFieldType {
            field: field.to_string(),
            kind: kind.to_string(),
        }
    }
}
