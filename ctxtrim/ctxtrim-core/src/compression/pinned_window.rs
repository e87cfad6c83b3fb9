//! Pinned window context compression.
//!
//! This strategy keeps a fixed number of messages at both ends of the
//! transcript and deletes from the middle, oldest first, until the token budget
//! is met. Messages inside a tool call/result exchange are never deleted, and a
//! repair pass removes whatever references the deletions broke.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::completion::Message;

use super::config::{CompressionConfig, PairingScope};
use super::estimator::{TokenCounter, estimate_message_tokens};
use super::pairing::protected_indices;
use super::repair::{RepairMode, repair};
use super::traits::{CompressionError, ContextCompressor};

/// Outcome of a single compression run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    /// The trimmed transcript.
    pub messages: Vec<Message>,
    pub tokens_before: usize,
    pub tokens_after: usize,
    /// Total messages removed, including those dropped by repair.
    pub messages_removed: usize,
    /// Messages dropped by the repair pass alone.
    pub orphans_removed: usize,
    /// The budget could not be met after every deletable message was removed.
    pub over_budget: bool,
}

impl CompressionReport {
    fn unchanged(messages: Vec<Message>, tokens: usize, over_budget: bool) -> Self {
        Self {
            messages,
            tokens_before: tokens,
            tokens_after: tokens,
            messages_removed: 0,
            orphans_removed: 0,
            over_budget,
        }
    }
}

/// A compressor that trims the unpinned middle of a transcript.
///
/// # Example
/// ```ignore
/// use ctxtrim::compression::PinnedWindowCompressor;
///
/// let compressor = PinnedWindowCompressor::new()
///     .with_pinned_start(1)  // Keep system prompt
///     .with_pinned_end(4);
/// let report = compressor.compress_with_report(&messages);
/// if report.over_budget {
///     // pinned and protected messages alone exceed the budget
/// }
/// ```
#[derive(Clone, Default)]
pub struct PinnedWindowCompressor {
    config: CompressionConfig,
    token_counter: Option<TokenCounter>,
}

impl fmt::Debug for PinnedWindowCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedWindowCompressor")
            .field("config", &self.config)
            .field("custom_token_counter", &self.token_counter.is_some())
            .finish()
    }
}

impl PinnedWindowCompressor {
    /// Create a compressor with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: CompressionConfig) -> Self {
        Self {
            config,
            token_counter: None,
        }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    pub fn with_max_input_tokens(mut self, tokens: usize) -> Self {
        self.config.max_input_tokens = tokens;
        self
    }

    /// Set the number of messages always kept at the front.
    pub fn with_pinned_start(mut self, count: usize) -> Self {
        self.config.pinned_start_count = count;
        self
    }

    /// Set the number of messages always kept at the back.
    pub fn with_pinned_end(mut self, count: usize) -> Self {
        self.config.pinned_end_count = count;
        self
    }

    pub fn with_pairing_scope(mut self, scope: PairingScope) -> Self {
        self.config.pairing_scope = scope;
        self
    }

    pub fn with_repair_mode(mut self, mode: RepairMode) -> Self {
        self.config.repair_mode = mode;
        self
    }

    /// Replace the built-in estimator with a custom per-message cost.
    ///
    /// The counter is re-run over the whole remaining transcript after every
    /// deletion, so it may keep interior state.
    pub fn with_token_counter<F>(mut self, counter: F) -> Self
    where
        F: Fn(&Message) -> usize + Send + Sync + 'static,
    {
        self.token_counter = Some(Arc::new(counter));
        self
    }

    fn message_tokens(&self, message: &Message) -> usize {
        match &self.token_counter {
            Some(counter) => counter(message),
            None => estimate_message_tokens(message),
        }
    }

    /// Total cost of `messages` under this compressor's cost function.
    pub fn count_tokens(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.message_tokens(m)).sum()
    }

    /// Compress against the configured `max_input_tokens` and report what happened.
    pub fn compress_with_report(&self, messages: &[Message]) -> CompressionReport {
        self.trim(messages.to_vec(), self.config.max_input_tokens)
    }

    fn trim(&self, messages: Vec<Message>, max_tokens: usize) -> CompressionReport {
        let tokens_before = self.count_tokens(&messages);
        if tokens_before <= max_tokens {
            tracing::debug!(tokens = tokens_before, max_tokens, "Transcript within budget");
            return CompressionReport::unchanged(messages, tokens_before, false);
        }

        let total = messages.len();
        let start_len = self.config.pinned_start_count.min(total);
        let end_len = self.config.pinned_end_count.min(total - start_len);
        let middle_len = total - start_len - end_len;

        if middle_len == 0 {
            tracing::warn!(
                tokens = tokens_before,
                max_tokens,
                "Transcript exceeds budget but every message is pinned"
            );
            return CompressionReport::unchanged(messages, tokens_before, true);
        }

        let protected = self.protected_middle(&messages, start_len, middle_len);

        let mut pinned_start = messages;
        let pinned_end = pinned_start.split_off(start_len + middle_len);
        let mut middle: Vec<(Message, bool)> = pinned_start
            .split_off(start_len)
            .into_iter()
            .enumerate()
            .map(|(idx, message)| (message, protected.contains(&idx)))
            .collect();

        // Protection travels with each message, not its position, as the
        // middle shrinks. The total is recounted every pass so a stateful
        // counter always sees the current transcript.
        let mut deleted = 0;
        loop {
            let tokens = self.count_tokens(&pinned_start)
                + middle
                    .iter()
                    .map(|(message, _)| self.message_tokens(message))
                    .sum::<usize>()
                + self.count_tokens(&pinned_end);
            if tokens <= max_tokens {
                break;
            }
            let Some(idx) = middle.iter().position(|(_, protected)| !protected) else {
                break;
            };
            let (message, _) = middle.remove(idx);
            deleted += 1;
            tracing::trace!(role = ?message.role, tokens, "Deleted middle message");
        }

        let middle: Vec<Message> = middle.into_iter().map(|(message, _)| message).collect();
        let before_repair = pinned_start.len() + middle.len() + pinned_end.len();
        let messages = repair(pinned_start, middle, pinned_end, self.config.repair_mode);
        let orphans_removed = before_repair - messages.len();

        let tokens_after = self.count_tokens(&messages);
        let over_budget = tokens_after > max_tokens;
        if over_budget {
            tracing::warn!(
                tokens = tokens_after,
                max_tokens,
                "No deletable messages left; transcript still exceeds budget"
            );
        }

        tracing::debug!(
            tokens_before,
            tokens_after,
            deleted,
            orphans_removed,
            "Compressed transcript"
        );

        CompressionReport {
            messages,
            tokens_before,
            tokens_after,
            messages_removed: deleted + orphans_removed,
            orphans_removed,
            over_budget,
        }
    }

    /// Middle-relative positions that must not be deleted.
    fn protected_middle(
        &self,
        messages: &[Message],
        start_len: usize,
        middle_len: usize,
    ) -> BTreeSet<usize> {
        match self.config.pairing_scope {
            PairingScope::FullTranscript => protected_indices(messages)
                .into_iter()
                .filter_map(|idx| idx.checked_sub(start_len))
                .filter(|idx| *idx < middle_len)
                .collect(),
            PairingScope::MiddleOnly => {
                protected_indices(&messages[start_len..start_len + middle_len])
            }
        }
    }
}

impl ContextCompressor for PinnedWindowCompressor {
    fn compress(
        &self,
        messages: Vec<Message>,
        max_tokens: usize,
    ) -> Result<Vec<Message>, CompressionError> {
        Ok(self.trim(messages, max_tokens).messages)
    }

    fn estimate_tokens(&self, messages: &[Message]) -> usize {
        self.count_tokens(messages)
    }
}
