//! Fast token estimation without external dependencies.
//!
//! A word-and-punctuation heuristic: every whitespace-separated word costs one
//! token and every punctuation mark inside it costs one more. It is a cheap
//! proxy for budgeting, not a model tokenizer.

use std::sync::Arc;

use crate::completion::{Content, Message};

/// Per-message cost override. When set it replaces [`estimate_message_tokens`]
/// for every message.
pub type TokenCounter = Arc<dyn Fn(&Message) -> usize + Send + Sync>;

/// Whitespace as understood by the splitting rule: Unicode `White_Space`
/// except NEL (U+0085), plus the byte order mark (U+FEFF).
#[inline]
fn is_word_separator(ch: char) -> bool {
    match ch {
        '\u{feff}' => true,
        '\u{85}' => false,
        _ => ch.is_whitespace(),
    }
}

#[inline]
fn is_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\''
    )
}

/// Estimate token count for a text string.
///
/// Splitting on whitespace runs always yields at least one (possibly empty)
/// word, so the empty string costs 1. Leading and trailing whitespace each
/// contribute an empty word as well.
pub fn estimate_tokens(text: &str) -> usize {
    let mut tokens = 1;
    let mut in_whitespace = false;

    for ch in text.chars() {
        if is_word_separator(ch) {
            if !in_whitespace {
                tokens += 1;
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            if is_punctuation(ch) {
                tokens += 1;
            }
        }
    }

    tokens
}

/// Canonical string form of a message's content used for costing.
///
/// Plain text is taken verbatim; part sequences are serialized to compact JSON.
pub fn message_text(message: &Message) -> String {
    match &message.content {
        Content::Text(text) => text.clone(),
        Content::Parts(parts) => serde_json::to_string(parts).unwrap_or_else(|err| {
            tracing::warn!("Failed to serialize message parts for estimation: {err}");
            String::new()
        }),
    }
}

/// Estimate token count for a single message.
pub fn estimate_message_tokens(message: &Message) -> usize {
    match &message.content {
        Content::Text(text) => estimate_tokens(text),
        Content::Parts(_) => estimate_tokens(&message_text(message)),
    }
}

/// Estimate token count for a sequence of messages.
pub fn estimate_messages_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}
