//! Core traits for the filtering stage.
//!
//! Filters run over the raw interaction log before sequences are built.

use crate::error::Result;
use data_loader::Rating;

/// A composable filter over interaction records.
///
/// `Send + Sync` so a pipeline can be shared across rayon workers.
pub trait InteractionFilter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter, keeping the relative order of surviving records.
    fn apply(&self, ratings: Vec<Rating>) -> Result<Vec<Rating>>;
}
