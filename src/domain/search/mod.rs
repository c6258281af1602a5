//! Search configuration, schema simplification and reply conformance.

pub mod conformance;
mod config;
mod error;
mod schema;

pub use config::{FieldDefinition, FieldType, SearchConfig};
pub use conformance::ConformanceError;
pub use error::ConfigurationError;
pub use schema::{simplify, SimplifiedSchema};
