//! Filter to drop weak interactions before sequences are built.

use crate::error::Result;
use crate::traits::InteractionFilter;
use data_loader::Rating;

/// Keeps interactions whose rating is at least `min_rating`.
pub struct MinimumRatingFilter {
    min_rating: f32,
}

impl MinimumRatingFilter {
    pub fn new(min_rating: f32) -> Self {
        Self { min_rating }
    }
}

impl InteractionFilter for MinimumRatingFilter {
    fn name(&self) -> &str {
        "MinimumRatingFilter"
    }

    fn apply(&self, ratings: Vec<Rating>) -> Result<Vec<Rating>> {
        Ok(ratings
            .into_iter()
            .filter(|rating| rating.rating >= self.min_rating)
            .collect())
    }
}
