//! Windowing parameters for the sequence builder.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_CONTEXT_LENGTH: usize = 10;
pub const DEFAULT_MIN_SEQUENCE_LENGTH: usize = 3;

/// How user histories are cut into training examples.
///
/// Deserialization goes through [`SequenceConfig::new`], so stored configs
/// are validated the same way as constructed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSequenceConfig")]
pub struct SequenceConfig {
    max_context_length: usize,
    min_sequence_length: usize,
}

impl SequenceConfig {
    /// Create a validated configuration.
    ///
    /// A zero-length window or a minimum below two interactions can only
    /// produce empty or label-less examples, so both are rejected.
    pub fn new(max_context_length: usize, min_sequence_length: usize) -> Result<Self> {
        if max_context_length == 0 {
            return Err(PipelineError::InvalidConfig {
                field: "max_context_length".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if min_sequence_length < 2 {
            return Err(PipelineError::InvalidConfig {
                field: "min_sequence_length".to_string(),
                reason: format!("must be at least 2, got {}", min_sequence_length),
            });
        }

        Ok(Self {
            max_context_length,
            min_sequence_length,
        })
    }

    /// Fixed length of every context window.
    pub fn max_context_length(&self) -> usize {
        self.max_context_length
    }

    /// Users with fewer interactions than this contribute no examples.
    pub fn min_sequence_length(&self) -> usize {
        self.min_sequence_length
    }
}

#[derive(Deserialize)]
struct RawSequenceConfig {
    max_context_length: usize,
    min_sequence_length: usize,
}

impl TryFrom<RawSequenceConfig> for SequenceConfig {
    type Error = PipelineError;

    fn try_from(raw: RawSequenceConfig) -> Result<Self> {
        Self::new(raw.max_context_length, raw.min_sequence_length)
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_context_length: DEFAULT_MAX_CONTEXT_LENGTH,
            min_sequence_length: DEFAULT_MIN_SEQUENCE_LENGTH,
        }
    }
}
