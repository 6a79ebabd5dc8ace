//! The FilterPipeline chains interaction filters together.

use crate::error::Result;
use crate::traits::InteractionFilter;
use data_loader::Rating;

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new().add_filter(MinimumRatingFilter::new(2.0));
/// let kept = pipeline.apply(ratings)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn InteractionFilter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl InteractionFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in insertion order.
    pub fn apply(&self, ratings: Vec<Rating>) -> Result<Vec<Rating>> {
        let mut current = ratings;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current)?;
            tracing::debug!(
                filter = filter.name(),
                before,
                after = current.len(),
                "Applied interaction filter"
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::MinimumRatingFilter;

    fn ratings() -> Vec<Rating> {
        [1.0, 2.0, 3.0, 5.0]
            .iter()
            .enumerate()
            .map(|(i, &rating)| Rating {
                user_id: 1,
                movie_id: i as u32 + 1,
                rating,
                timestamp: i as i64,
            })
            .collect()
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();

        let filtered = pipeline.apply(ratings()).unwrap();
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_filters_compose() {
        let pipeline = FilterPipeline::new()
            .add_filter(MinimumRatingFilter::new(2.0))
            .add_filter(MinimumRatingFilter::new(3.0));

        let filtered = pipeline.apply(ratings()).unwrap();
        let ids: Vec<u32> = filtered.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![3, 4]);
    }
}
