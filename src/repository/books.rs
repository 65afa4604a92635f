//! Book domain methods on Repository

use sqlx::{Postgres, Transaction};

use super::Repository;
use crate::{
    error::{conflict_on_unique, AppError, AppResult},
    models::book::{Book, BookInput},
};

const DUPLICATE_ISBN: &str = "Book with this ISBN already exists";

/// LIKE pattern matching `word` anywhere, with its own wildcards taken literally
fn contains_pattern(word: &str) -> String {
    let mut pattern = String::with_capacity(word.len() + 2);
    pattern.push('%');
    for c in word.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Repository {
    /// Count all books
    pub async fn books_count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count books whose title contains `word`, ignoring case
    pub async fn books_count_title_contains(&self, word: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM books WHERE title ILIKE $1 ESCAPE '\'"
        )
        .bind(contains_pattern(word))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// List one page of books ordered by title
    pub async fn books_list(&self, limit: i64, offset: i64) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, summary, isbn, language_id
            FROM books
            ORDER BY title, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get book by ID
    pub async fn books_get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, summary, isbn, language_id FROM books WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Check whether an ISBN is taken, optionally ignoring one book
    pub async fn books_isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id != $2))"
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create book with its author and genre links
    pub async fn books_create(&self, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, summary, isbn, language_id
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(DUPLICATE_ISBN))?;

        Self::books_link(&mut tx, book.id, &data.author_ids, &data.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Replace a book's fields and links
    pub async fn books_update(&self, id: i32, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = $1, summary = $2, isbn = $3, language_id = $4
            WHERE id = $5
            RETURNING id, title, summary, isbn, language_id
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(conflict_on_unique(DUPLICATE_ISBN))?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        Self::books_link(&mut tx, id, &data.author_ids, &data.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    async fn books_link(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        author_ids: &[i32],
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO book_authors (book_id, author_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING"
        )
        .bind(book_id)
        .bind(author_ids)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING"
        )
        .bind(book_id)
        .bind(genre_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Delete book. Refused while copies of it exist.
    pub async fn books_delete(&self, id: i32) -> AppResult<()> {
        let copies: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE book_id = $1"
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if copies > 0 {
            return Err(AppError::BusinessRule(format!(
                "Book {} still has {} copies",
                id, copies
            )));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}
