//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, book_instance::BookInstanceDetails, genre::Genre, language::Language};

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    /// ISBN, unique across the catalog
    pub isbn: String,
    pub language_id: Option<i32>,
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Minimal book reference
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub isbn: String,
}

/// Book list entry with its credits rendered for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    /// Authors as "last, first", comma separated
    pub display_author: String,
    /// Genre names, comma separated
    pub display_genre: String,
}

/// Book with its authors, genres, language and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub language: Option<Language>,
    pub authors: Vec<Author>,
    pub genres: Vec<Genre>,
    pub display_author: String,
    pub display_genre: String,
    pub copies: Vec<BookInstanceDetails>,
}

/// Create or update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    /// Title of the book
    #[validate(length(min = 1, max = 120, message = "Title must be 1 to 120 characters"))]
    pub title: String,
    /// Type the description of the book
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1 to 1000 characters"))]
    pub summary: String,
    /// Enter the ISBN of the book
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1 to 13 characters"))]
    pub isbn: String,
    /// Enter the author(s) of the book
    #[validate(length(min = 1, message = "At least one author is required"))]
    pub author_ids: Vec<i32>,
    /// Enter the genre(s) of the book
    #[validate(length(min = 1, message = "At least one genre is required"))]
    pub genre_ids: Vec<i32>,
    pub language_id: Option<i32>,
}

/// Render authors the way book lists show them
pub fn display_author(authors: &[Author]) -> String {
    authors
        .iter()
        .map(Author::display_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render genres the way book lists show them
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_author_joins_last_first() {
        let authors = vec![
            Author {
                id: 1,
                first_name: "David".into(),
                last_name: "One".into(),
                date_of_birth: None,
                date_of_death: None,
            },
            Author {
                id: 2,
                first_name: "Ann".into(),
                last_name: "Two".into(),
                date_of_birth: None,
                date_of_death: None,
            },
        ];
        assert_eq!(display_author(&authors), "One, David, Two, Ann");
        assert_eq!(display_author(&[]), "");
    }

    #[test]
    fn test_display_genre() {
        let genres = vec![
            Genre { id: 1, name: "Science fiction".into() },
            Genre { id: 2, name: "Drama".into() },
        ];
        assert_eq!(display_genre(&genres), "Science fiction, Drama");
    }

    #[test]
    fn test_input_requires_author_and_genre() {
        let input = BookInput {
            title: "Cyberpunk".into(),
            summary: "2077".into(),
            isbn: "2079".into(),
            author_ids: vec![],
            genre_ids: vec![1],
            language_id: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_input_isbn_max_13() {
        let input = BookInput {
            title: "Cyberpunk".into(),
            summary: "2077".into(),
            isbn: "97800000000001".into(),
            author_ids: vec![1],
            genre_ids: vec![1],
            language_id: Some(1),
        };
        assert!(input.validate().is_err());
    }
}
