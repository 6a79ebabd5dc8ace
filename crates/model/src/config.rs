//! Model and training hyperparameters.

use crate::error::{ModelError, Result};
use pipeline::config::DEFAULT_MAX_CONTEXT_LENGTH;
use serde::{Deserialize, Serialize};

/// Shape of a [`SequentialRetrievalModel`](crate::SequentialRetrievalModel).
///
/// Stored verbatim in saved model archives so they can be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Rows in each item embedding table, including padding row 0.
    pub num_items: usize,
    /// Width of item embeddings and of the recurrent hidden state.
    pub embedding_dim: usize,
    /// Number of candidates returned by retrieval.
    pub top_k: usize,
    /// Window length the query tower was trained on. Histories passed to
    /// [`recommend`](crate::SequentialRetrievalModel::recommend) are padded
    /// or truncated to it.
    pub context_length: usize,
}

impl ModelConfig {
    pub fn new(num_items: usize, embedding_dim: usize) -> Self {
        Self {
            num_items,
            embedding_dim,
            top_k: 10,
            context_length: DEFAULT_MAX_CONTEXT_LENGTH,
        }
    }

    /// Set the query window length.
    pub fn context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    /// Set the number of retrieved candidates.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("num_items", self.num_items),
            ("embedding_dim", self.embedding_dim),
            ("top_k", self.top_k),
            ("context_length", self.context_length),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ModelError::InvalidConfig {
                    field: field.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// AdamW with a linearly decaying learning rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    /// Learning rate at step 0.
    pub learning_rate: f64,
    /// Learning rate reached after the final step.
    pub end_learning_rate: f64,
    pub weight_decay: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            learning_rate: 0.05,
            end_learning_rate: 0.0,
            weight_decay: 0.004,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
        }
    }
}

impl TrainingConfig {
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }
}
