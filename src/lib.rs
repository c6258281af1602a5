//! Chat Relay - backend for an embeddable shopping-assistant chat widget
//!
//! Relays the widget's conversations to a hosted language model: streamed
//! replies, structured search-data and customer extraction, moderation and
//! personalised content generation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
