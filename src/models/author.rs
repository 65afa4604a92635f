//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookShort;

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Died
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "last, first" form used in lists and book credits
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

/// Author with the books they wrote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<BookShort>,
}

/// Create or update author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorInput {
    /// Enter first name of author of book
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    /// Enter last name of author of book
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Initial values offered by the author creation form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorFormInitial {
    pub date_of_death: NaiveDate,
}

impl Default for AuthorFormInitial {
    fn default() -> Self {
        Self {
            date_of_death: NaiveDate::from_ymd_opt(2016, 12, 10).unwrap_or_default(),
        }
    }
}
