//! Core domain types for the interaction log and the item catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie. Id 0 never appears in the catalog and is
/// reserved downstream as the padding item.
pub type MovieId = u32;

// =============================================================================
// Interaction Type
// =============================================================================

/// A single timestamped interaction between a user and a movie.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 1.0 to 5.0
    pub rating: f32,
    /// Unix timestamp when the rating was made
    pub timestamp: i64,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Represents a movie in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    pub genres: Vec<Genre>,
}

/// The 18 genres used by MovieLens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

/// Lookup table from movie id to catalog record.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: HashMap<MovieId, Movie>,
    max_movie_id: MovieId,
}

impl Catalog {
    /// Creates a new, empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a movie, replacing any previous record with the same id.
    pub fn insert_movie(&mut self, movie: Movie) {
        self.max_movie_id = self.max_movie_id.max(movie.id);
        self.movies.insert(movie.id, movie);
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.movies.contains_key(&id)
    }

    /// Title for `id`, or the empty string for the padding id and for ids
    /// missing from the catalog.
    pub fn title(&self, id: MovieId) -> &str {
        self.movies
            .get(&id)
            .map(|movie| movie.title.as_str())
            .unwrap_or("")
    }

    /// Largest movie id seen so far (0 for an empty catalog).
    pub fn max_movie_id(&self) -> MovieId {
        self.max_movie_id
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

impl FromIterator<Movie> for Catalog {
    fn from_iter<I: IntoIterator<Item = Movie>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for movie in iter {
            catalog.insert_movie(movie);
        }
        catalog
    }
}

// =============================================================================
// MovieLens - ratings plus catalog
// =============================================================================

/// Everything read from a MovieLens-style directory: the raw interaction log
/// in file order, and the item catalog.
#[derive(Debug, Clone, Default)]
pub struct MovieLens {
    pub(crate) ratings: Vec<Rating>,
    pub(crate) catalog: Catalog,
}

impl MovieLens {
    pub fn new(ratings: Vec<Rating>, catalog: Catalog) -> Self {
        Self { ratings, catalog }
    }

    /// Interactions in the order they appeared in the source file.
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Size of an item embedding table that can index every id in the
    /// catalog and the interaction log, with row 0 left for padding.
    pub fn num_items(&self) -> usize {
        let max_rated = self
            .ratings
            .iter()
            .map(|rating| rating.movie_id)
            .max()
            .unwrap_or(0);

        max_rated.max(self.catalog.max_movie_id()) as usize + 1
    }

    /// Get counts for debugging/validation: (distinct users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut users: Vec<UserId> = self.ratings.iter().map(|r| r.user_id).collect();
        users.sort_unstable();
        users.dedup();

        (users.len(), self.catalog.len(), self.ratings.len())
    }
}
