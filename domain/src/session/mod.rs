//! Conversation domain - the message history sent to a model.

pub mod entities;

pub use entities::{Message, Role};
