//! Conversation data model shared by every compression strategy.

pub mod message;

pub use message::{Content, Message, Part, Role};
