//! Configuration for the pinned window compressor.

use serde::{Deserialize, Serialize};

use super::repair::RepairMode;
use super::traits::CompressionError;

pub const DEFAULT_MAX_INPUT_TOKENS: usize = 8000;
pub const DEFAULT_PINNED_START_COUNT: usize = 4;
pub const DEFAULT_PINNED_END_COUNT: usize = 5;

/// Which messages exchange pairing is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PairingScope {
    /// Pair over the whole transcript, so exchanges straddling a pin boundary
    /// still protect their middle portion.
    #[default]
    FullTranscript,
    /// Pair over the trimmable middle only. Exchanges that cross a pin
    /// boundary are not protected.
    MiddleOnly,
}

/// Options recognised by [`PinnedWindowCompressor`](super::PinnedWindowCompressor).
///
/// Every field has a default, so partial JSON such as `{"maxInputTokens": 4000}`
/// deserializes into a complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionConfig {
    /// Hard token budget for the trimmed transcript.
    pub max_input_tokens: usize,
    /// Messages always kept at the front.
    pub pinned_start_count: usize,
    /// Messages always kept at the back.
    pub pinned_end_count: usize,
    pub pairing_scope: PairingScope,
    pub repair_mode: RepairMode,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            pinned_start_count: DEFAULT_PINNED_START_COUNT,
            pinned_end_count: DEFAULT_PINNED_END_COUNT,
            pairing_scope: PairingScope::default(),
            repair_mode: RepairMode::default(),
        }
    }
}

impl CompressionConfig {
    /// Parse a configuration from JSON, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, CompressionError> {
        serde_json::from_str(json).map_err(|e| CompressionError::InvalidConfig(e.to_string()))
    }
}
