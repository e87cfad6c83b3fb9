//! Token-budgeted trimming of conversation transcripts.
//!
//! `ctxtrim` drops messages from the middle of a transcript until its
//! estimated token cost fits a budget. A fixed number of messages at the
//! start and end are pinned, tool call/result exchanges are never split, and
//! a repair pass removes any tool call or result left without its partner.
//!
//! # Example
//! ```ignore
//! use ctxtrim::compression::{CompressionConfig, ContextCompressor, PinnedWindowCompressor};
//!
//! let compressor = PinnedWindowCompressor::from_config(CompressionConfig::default());
//! let trimmed = compressor.compress(messages, 8000)?;
//! ```

pub mod completion;
pub mod compression;
