//! Error types for the model crate.

use pipeline::PipelineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Tensor runtime failure (shape mismatch, dtype, numerics)
    #[error("Tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Model archive could not be (de)serialized
    #[error("Safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model configuration metadata could not be (de)serialized
    #[error("Config serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Archive has no `config` metadata entry
    #[error("Model archive {path} carries no configuration metadata")]
    MissingConfig { path: String },

    /// Archive lacks a tensor the model expects
    #[error("Model archive is missing tensor {name}")]
    MissingTensor { name: String },

    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// The query tower needs at least one context position
    #[error("Context sequences must not be empty")]
    EmptyContext,

    /// The parameter map lock was poisoned by a panicking thread
    #[error("Model parameters are unavailable (lock poisoned)")]
    PoisonedParameters,
}

pub type Result<T> = std::result::Result<T, ModelError>;
