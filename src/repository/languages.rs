//! Language domain methods on Repository

use super::Repository;
use crate::{
    error::{conflict_on_unique, AppError, AppResult},
    models::language::Language,
};

impl Repository {
    /// Count all languages
    pub async fn languages_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM languages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List one page of languages ordered by name
    pub async fn languages_list(&self, limit: i64, offset: i64) -> AppResult<Vec<Language>> {
        let rows = sqlx::query_as::<_, Language>(
            "SELECT id, name FROM languages ORDER BY name, id LIMIT $1 OFFSET $2"
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get language by ID
    pub async fn languages_get_by_id(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT id, name FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))
    }

    /// Case-insensitive name lookup, optionally ignoring one language
    pub async fn languages_name_exists(&self, name: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM languages WHERE LOWER(name) = LOWER($1) AND ($2::int IS NULL OR id != $2))"
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create language
    pub async fn languages_create(&self, name: &str) -> AppResult<Language> {
        let row = sqlx::query_as::<_, Language>(
            "INSERT INTO languages (name) VALUES ($1) RETURNING id, name"
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("Language already exists"))?;
        Ok(row)
    }

    /// Rename language
    pub async fn languages_update(&self, id: i32, name: &str) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("UPDATE languages SET name = $1 WHERE id = $2 RETURNING id, name")
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_on_unique("Language already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("Language {} not found", id)))
    }

    /// Delete language; its books keep existing with no language
    pub async fn languages_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM languages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Language {} not found", id)));
        }
        Ok(())
    }
}
