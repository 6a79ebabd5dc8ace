//! Filter implementations for the interaction pipeline.

pub mod minimum_rating;

pub use minimum_rating::MinimumRatingFilter;
