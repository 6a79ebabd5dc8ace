//! Parser for MovieLens data files.
//!
//! - movies.dat: movieId::title::genres
//! - ratings.dat: userId::movieId::rating::timestamp
//!
//! Rows are assumed to be well formed. Anything that is not becomes a
//! [`DataLoadError`] carrying the file name and line number.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::{FromStr, Split};

const FIELD_SEPARATOR: &str = "::";

/// Read a file encoded as ISO-8859-1 (Latin-1).
///
/// Each byte maps directly to the Unicode code point of the same value, so
/// the conversion never fails.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();

    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Name used in error messages for a path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Cursor over the `::`-separated fields of one line.
struct Fields<'a> {
    parts: Split<'a, &'static str>,
    file: &'a str,
    line: usize,
}

impl<'a> Fields<'a> {
    fn new(line_text: &'a str, file: &'a str, line: usize) -> Self {
        Self {
            parts: line_text.split(FIELD_SEPARATOR),
            file,
            line,
        }
    }

    fn error(&self, reason: String) -> DataLoadError {
        DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }

    /// Next raw field, or a parse error naming the missing column.
    fn next_str(&mut self, name: &str) -> Result<&'a str> {
        match self.parts.next() {
            Some(value) => Ok(value),
            None => Err(self.error(format!("Missing {}", name))),
        }
    }

    /// Next field parsed into `T`.
    fn next_parsed<T>(&mut self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.next_str(name)?;
        raw.trim()
            .parse()
            .map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }
}

/// Iterate over the non-blank lines of a file with 1-based line numbers.
fn for_each_record<F>(path: &Path, mut handle: F) -> Result<()>
where
    F: FnMut(Fields<'_>) -> Result<()>,
{
    let file = display_name(path);
    let lines = read_lines_latin1(path)?;

    for (idx, line) in lines.iter().enumerate() {
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }
        handle(Fields::new(line_trimmed, &file, idx + 1))?;
    }

    Ok(())
}

/// Parse the movies.dat file
///
/// The title often includes the year in parentheses: "Toy Story (1995)".
/// Genres are pipe-separated: "Animation|Children's|Comedy".
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let mut movies = Vec::new();

    for_each_record(path, |mut fields| {
        let id = fields.next_parsed("movieId")?;
        let title = fields.next_str("title")?;
        let genres = fields.next_str("genres")?;

        movies.push(Movie {
            id,
            title: title.to_string(),
            year: extract_year_from_title(title),
            genres: parse_genres(genres)?,
        });
        Ok(())
    })?;

    Ok(movies)
}

/// Parse the ratings.dat file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let mut ratings = Vec::new();

    for_each_record(path, |mut fields| {
        ratings.push(Rating {
            user_id: fields.next_parsed("userId")?,
            movie_id: fields.next_parsed("movieId")?,
            rating: fields.next_parsed("rating")?,
            timestamp: fields.next_parsed("timestamp")?,
        });
        Ok(())
    })?;

    Ok(ratings)
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        return title[start + 1..end].parse::<u16>().ok();
    }
    None
}

fn parse_genre(s: &str) -> Result<Genre> {
    match s {
        "Action" => Ok(Genre::Action),
        "Adventure" => Ok(Genre::Adventure),
        "Animation" => Ok(Genre::Animation),
        "Children's" => Ok(Genre::Children), // MovieLens spells it with an apostrophe
        "Comedy" => Ok(Genre::Comedy),
        "Crime" => Ok(Genre::Crime),
        "Documentary" => Ok(Genre::Documentary),
        "Drama" => Ok(Genre::Drama),
        "Fantasy" => Ok(Genre::Fantasy),
        "Film-Noir" => Ok(Genre::FilmNoir),
        "Horror" => Ok(Genre::Horror),
        "Musical" => Ok(Genre::Musical),
        "Mystery" => Ok(Genre::Mystery),
        "Romance" => Ok(Genre::Romance),
        "Sci-Fi" => Ok(Genre::SciFi),
        "Thriller" => Ok(Genre::Thriller),
        "War" => Ok(Genre::War),
        "Western" => Ok(Genre::Western),
        _ => Err(DataLoadError::InvalidValue {
            field: "genre".to_string(),
            value: s.to_string(),
        }),
    }
}

/// Parse pipe-separated genres
fn parse_genres(s: &str) -> Result<Vec<Genre>> {
    s.split('|').map(parse_genre).collect()
}
