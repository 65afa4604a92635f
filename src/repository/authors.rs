//! Author domain methods on Repository

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorInput},
        book::BookShort,
    },
};

impl Repository {
    /// Count all authors
    pub async fn authors_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// List one page of authors ordered by last name, then first name
    pub async fn authors_list(&self, limit: i64, offset: i64) -> AppResult<Vec<Author>> {
        let rows = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, first_name, last_name, date_of_birth, date_of_death
            FROM authors
            ORDER BY last_name, first_name, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get author by ID
    pub async fn authors_get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death FROM authors WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    /// Books credited to an author, ordered by title
    pub async fn authors_books(&self, author_id: i32) -> AppResult<Vec<BookShort>> {
        let rows = sqlx::query_as::<_, BookShort>(
            r#"
            SELECT b.id, b.title, b.isbn
            FROM books b
            JOIN book_authors ba ON ba.book_id = b.id
            WHERE ba.author_id = $1
            ORDER BY b.title, b.id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Count how many of `ids` are existing authors
    pub async fn authors_count_existing(&self, ids: &[i32]) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Authors of each book in `book_ids`, as (book_id, author) pairs in author order
    pub async fn authors_for_books(&self, book_ids: &[i32]) -> AppResult<Vec<(i32, Author)>> {
        let rows: Vec<(i32, i32, String, String, Option<chrono::NaiveDate>, Option<chrono::NaiveDate>)> =
            sqlx::query_as(
                r#"
                SELECT ba.book_id, a.id, a.first_name, a.last_name, a.date_of_birth, a.date_of_death
                FROM book_authors ba
                JOIN authors a ON a.id = ba.author_id
                WHERE ba.book_id = ANY($1)
                ORDER BY a.last_name, a.first_name, a.id
                "#,
            )
            .bind(book_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(book_id, id, first_name, last_name, date_of_birth, date_of_death)| {
                (
                    book_id,
                    Author {
                        id,
                        first_name,
                        last_name,
                        date_of_birth,
                        date_of_death,
                    },
                )
            })
            .collect())
    }

    /// Create author
    pub async fn authors_create(&self, data: &AuthorInput) -> AppResult<Author> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, date_of_birth, date_of_death
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.date_of_birth)
        .bind(data.date_of_death)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update author
    pub async fn authors_update(&self, id: i32, data: &AuthorInput) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $1, last_name = $2, date_of_birth = $3, date_of_death = $4
            WHERE id = $5
            RETURNING id, first_name, last_name, date_of_birth, date_of_death
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.date_of_birth)
        .bind(data.date_of_death)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    /// Delete author; their book credits go with them
    pub async fn authors_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author {} not found", id)));
        }
        Ok(())
    }
}
