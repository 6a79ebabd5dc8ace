//! Two-tower sequential retrieval.
//!
//! A query tower (item embedding followed by a GRU) encodes a user's recent
//! history, a candidate tower (plain item embedding) encodes items, and the
//! pair is trained with an in-batch softmax loss where each example's
//! positive doubles as a negative for every other example in the batch.
//! Retrieval scores a query against the entire candidate table.
//!
//! ## Example Usage
//! ```ignore
//! use candle_core::Device;
//! use model::{ModelConfig, SequentialRetrievalModel, Trainer, TrainingConfig};
//!
//! let model = SequentialRetrievalModel::new(ModelConfig::new(num_items, 128), &Device::Cpu)?;
//! let mut trainer = Trainer::new(&model, TrainingConfig::default())?;
//! let history = trainer.fit(&train_batches, &test_batches)?;
//!
//! let top_k = model.recommend(&context)?;
//! model.save("model.safetensors")?;
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod loss;
pub mod model;
pub mod retrieval;
pub mod schedule;
pub mod towers;
pub mod trainer;

pub use config::{ModelConfig, TrainingConfig};
pub use error::{ModelError, Result};
pub use evaluation::{hit_rate_at_k, mean_loss};
pub use loss::{categorical_crossentropy_from_logits, identity_labels, in_batch_softmax_loss};
pub use model::{CONFIG_METADATA_KEY, SequentialRetrievalModel, batch_to_tensors};
pub use retrieval::{BruteForceRetrieval, Retrieved};
pub use schedule::PolynomialDecay;
pub use towers::{CandidateTower, QueryTower};
pub use trainer::{EpochMetrics, Trainer, TrainingHistory};
