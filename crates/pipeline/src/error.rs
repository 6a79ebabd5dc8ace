//! Error types for the pipeline crate.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// A configuration value that would only produce degenerate examples
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// A batch needs at least one example
    #[error("Cannot build a batch from zero examples")]
    EmptyBatch,

    /// Every context in a batch must have the same, non-zero length
    #[error("Example {index} has context length {found}, expected {expected}")]
    ContextLengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
