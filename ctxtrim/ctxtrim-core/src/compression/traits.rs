//! Core traits for context compression strategies.

use crate::completion::Message;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Invalid message structure: {0}")]
    InvalidStructure(String),
    #[error("Invalid compression config: {0}")]
    InvalidConfig(String),
}

/// Trait for pluggable context compression strategies.
pub trait ContextCompressor: Send + Sync {
    /// Compress messages to fit within the token budget.
    ///
    /// Returns a new vector of messages, ideally within `max_tokens`. The
    /// result keeps the relative order of the input and never splits a tool
    /// call from its result.
    fn compress(
        &self,
        messages: Vec<Message>,
        max_tokens: usize,
    ) -> Result<Vec<Message>, CompressionError>;

    /// Estimate the token count for a sequence of messages.
    fn estimate_tokens(&self, messages: &[Message]) -> usize;

    /// Check if compression is needed for the given messages and budget.
    fn needs_compression(&self, messages: &[Message], max_tokens: usize) -> bool {
        self.estimate_tokens(messages) > max_tokens
    }
}
