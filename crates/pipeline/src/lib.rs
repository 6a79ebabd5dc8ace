//! Data preparation for sequential retrieval.
//!
//! This crate turns a raw interaction log into batches of fixed-length
//! training examples:
//! 1. Filters drop unwanted interactions (e.g. low ratings)
//! 2. Interactions are grouped per user and ordered by time
//! 3. Each position of a user's history becomes one left-padded example
//! 4. Examples are shuffled, split and batched
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::filters::MinimumRatingFilter;
//! use pipeline::{FilterPipeline, SequenceConfig, batch_examples, prepare_examples, train_test_split};
//!
//! let ratings = FilterPipeline::new()
//!     .add_filter(MinimumRatingFilter::new(2.0))
//!     .apply(data.ratings().to_vec())?;
//!
//! let config = SequenceConfig::new(10, 3)?;
//! let examples = prepare_examples(&ratings, &config);
//! let (train, test) = train_test_split(examples, 0.9, &mut rng);
//! let train_batches = batch_examples(&train, 2048)?;
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod examples;
pub mod filter_pipeline;
pub mod filters;
pub mod sequences;
pub mod split;
pub mod traits;

pub use batch::{Batch, batch_examples};
pub use config::SequenceConfig;
pub use error::{PipelineError, Result};
pub use examples::{
    ItemId, PADDING_ITEM_ID, TrainingExample, examples_from_sequence, generate_examples,
    pad_context, prepare_examples,
};
pub use filter_pipeline::FilterPipeline;
pub use sequences::{UserSequence, group_by_user};
pub use split::train_test_split;
pub use traits::InteractionFilter;
