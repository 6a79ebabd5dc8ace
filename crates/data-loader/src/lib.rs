//! # Data Loader Crate
//!
//! Reads the MovieLens interaction log (`ratings.dat`) and item catalog
//! (`movies.dat`) into memory.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Rating, Movie, Genre, Catalog, MovieLens)
//! - **parser**: Parse `::`-separated .dat files into Rust structs
//! - **index**: Load a dataset directory and validate references
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::MovieLens;
//! use std::path::Path;
//!
//! let data = MovieLens::load_from_files(Path::new("data/ml-1m"))?;
//! println!("{} ratings over {} items", data.ratings().len(), data.num_items());
//! println!("{}", data.catalog().title(1193));
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

pub use error::{DataLoadError, Result};
pub use index::{MOVIES_FILE_NAME, RATINGS_FILE_NAME};
pub use types::{Catalog, Genre, Movie, MovieId, MovieLens, Rating, UserId};
