//! Genre model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Genre of book, name unique regardless of case
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Create or update genre request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenreInput {
    /// Enter genre of book
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,
}
