//! Domain layer: pure types and rules, no I/O.
//!
//! # Module Organization
//!
//! - `search` - Search configuration, schema simplification, reply conformance
//! - `customer` - Customer intention and prospect records
//! - `content` - Content generation requests, validation and results
//! - `conversation` - Message sanitization
//! - `moderation` - Moderation verdicts
//! - `prompts` - System instruction builders

pub mod content;
pub mod conversation;
pub mod customer;
pub mod moderation;
pub mod prompts;
pub mod search;
