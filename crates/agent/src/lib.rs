//! Conversation layer - turns free text into ranked housing results
//!
//! This crate sits between the front ends (HTTP API, terminal chat) and the
//! deterministic core:
//! - Extracts a structured `FilterSet` from natural language (`parser`)
//! - Recognizes the stateless chat intents and formats replies (`controller`)
//! - Routes agent contact requests to a pluggable `ContactDispatcher`
//!
//! # Flow
//!
//! 1. **Parse** (`parser`) - utterance → `FilterSet`
//! 2. **Search** (`homefinder_core::search`) - hard filters, scoring, ranking
//! 3. **Reply** (`controller`) - summary line plus one bullet per listing
//!
//! Nothing here keeps state between turns. Every call is resolved from its
//! own input against the shared read-only listing store.

pub mod controller;
pub mod parser;

pub use controller::{ChatIntent, ChatReply, ContactReply, ConversationController, SearchReply};
pub use parser::{NormalizedUtterance, QueryParser};
