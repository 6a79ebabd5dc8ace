//! Loading a MovieLens directory into memory.
//!
//! Parses `ratings.dat` and `movies.dat`, builds the [`Catalog`] and checks
//! that every interaction points at a catalogued movie.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{info, instrument};

pub const RATINGS_FILE_NAME: &str = "ratings.dat";
pub const MOVIES_FILE_NAME: &str = "movies.dat";

impl MovieLens {
    /// Load the interaction log and catalog from a directory.
    ///
    /// Both files are parsed in parallel; a malformed row in either aborts
    /// the load.
    #[instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        let ratings_path = data_dir.join(RATINGS_FILE_NAME);
        let movies_path = data_dir.join(MOVIES_FILE_NAME);

        let (ratings, movies) = rayon::join(
            || parser::parse_ratings(&ratings_path),
            || parser::parse_movies(&movies_path),
        );
        let ratings = ratings?;
        let movies = movies?;

        info!(
            ratings = ratings.len(),
            movies = movies.len(),
            "Parsed MovieLens files"
        );

        let data = MovieLens::new(ratings, movies.into_iter().collect());
        data.validate()?;

        Ok(data)
    }

    /// Validate data integrity
    ///
    /// Every rating must reference a catalogued movie and lie in 1.0 - 5.0.
    pub fn validate(&self) -> Result<()> {
        for rating in &self.ratings {
            if !self.catalog.contains(rating.movie_id) {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id,
                });
            }
            if !(1.0..=5.0).contains(&rating.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }
        Ok(())
    }
}
