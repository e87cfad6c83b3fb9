//! Context compression for keeping transcripts within a token budget.
//!
//! The pinned window strategy trims the middle of a transcript while keeping
//! its first and last messages, tool call/result exchanges and the
//! no-dangling-reference guarantee intact.

mod config;
mod estimator;
mod pairing;
mod pinned_window;
mod repair;
mod traits;

pub use config::{
    CompressionConfig, DEFAULT_MAX_INPUT_TOKENS, DEFAULT_PINNED_END_COUNT,
    DEFAULT_PINNED_START_COUNT, PairingScope,
};
pub use estimator::{
    TokenCounter, estimate_message_tokens, estimate_messages_tokens, estimate_tokens, message_text,
};
pub use pairing::{exchange_spans, protected_indices};
pub use pinned_window::{CompressionReport, PinnedWindowCompressor};
pub use repair::{RepairMode, repair};
pub use traits::{CompressionError, ContextCompressor};
