//! Genre domain methods on Repository

use super::Repository;
use crate::{
    error::{conflict_on_unique, AppError, AppResult},
    models::genre::Genre,
};

impl Repository {
    /// Count all genres
    pub async fn genres_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List one page of genres ordered by name
    pub async fn genres_list(&self, limit: i64, offset: i64) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>(
            "SELECT id, name FROM genres ORDER BY name, id LIMIT $1 OFFSET $2"
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get genre by ID
    pub async fn genres_get_by_id(&self, id: i32) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    /// Case-insensitive name lookup, optionally ignoring one genre
    pub async fn genres_name_exists(&self, name: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM genres WHERE LOWER(name) = LOWER($1) AND ($2::int IS NULL OR id != $2))"
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Count how many of `ids` are existing genres
    pub async fn genres_count_existing(&self, ids: &[i32]) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Genres of each book in `book_ids`, as (book_id, genre) pairs ordered by name
    pub async fn genres_for_books(&self, book_ids: &[i32]) -> AppResult<Vec<(i32, Genre)>> {
        let rows: Vec<(i32, i32, String)> = sqlx::query_as(
            r#"
            SELECT bg.book_id, g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = ANY($1)
            ORDER BY g.name, g.id
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(book_id, id, name)| (book_id, Genre { id, name }))
            .collect())
    }

    /// Create genre
    pub async fn genres_create(&self, name: &str) -> AppResult<Genre> {
        let row = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name) VALUES ($1) RETURNING id, name"
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_unique("Genre already exists"))?;
        Ok(row)
    }

    /// Rename genre
    pub async fn genres_update(&self, id: i32, name: &str) -> AppResult<Genre> {
        sqlx::query_as::<_, Genre>("UPDATE genres SET name = $1 WHERE id = $2 RETURNING id, name")
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_on_unique("Genre already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
    }

    /// Delete genre; books lose the genre
    pub async fn genres_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Genre {} not found", id)));
        }
        Ok(())
    }
}
