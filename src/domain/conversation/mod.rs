//! Conversation handling shared by every endpoint.

mod sanitizer;

pub use sanitizer::MessageSanitizer;
