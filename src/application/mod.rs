//! Application layer - Commands and Handlers.
//!
//! Each relay operation is a handler that validates its command, builds the
//! instructions from the domain prompt catalogue and drives the AI ports.

mod chat;
mod content;
mod error;
mod extraction;
mod moderation;

pub use chat::{ReplyStream, StreamChatCommand, StreamChatHandler};
pub use content::{ContentGenerator, DEFAULT_MATCH_THRESHOLD};
pub use error::RelayError;
pub use extraction::{
    ExtractCustomerCommand, ExtractSearchDataCommand, ExtractionHandler, StructuredExtractor,
    SEARCH_DATA_SCHEMA_NAME,
};
pub use moderation::{ModerateMessageCommand, ModerateMessageHandler};
