//! Book instance (copy) domain methods on Repository

use chrono::NaiveDate;
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceInput, LoanStatus},
};

const SELECT_INSTANCE: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.due_back, bi.status,
           bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

/// Copies without a due date sort last
const ORDER_INSTANCE: &str = "ORDER BY bi.due_back ASC NULLS LAST, bi.id";

/// Filters applied to copy listings
#[derive(Debug, Clone, Default)]
pub struct InstanceFilter {
    pub status: Option<LoanStatus>,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
}

impl InstanceFilter {
    /// Copies on loan, optionally to one borrower
    pub fn on_loan(borrower_id: Option<i32>) -> Self {
        Self {
            status: Some(LoanStatus::OnLoan),
            due_back: None,
            borrower_id,
        }
    }

    fn columns(&self) -> Vec<&'static str> {
        [
            ("bi.status", self.status.is_some()),
            ("bi.due_back", self.due_back.is_some()),
            ("bi.borrower_id", self.borrower_id.is_some()),
        ]
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(column, _)| column)
        .collect()
    }

    /// WHERE clause with placeholders numbered from $1, in bind order
    fn where_clause(&self) -> String {
        let conditions: Vec<String> = self
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 1))
            .collect();

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    fn bind_count(&self) -> usize {
        self.columns().len()
    }
}

impl Repository {
    /// Count copies matching `filter`
    pub async fn book_instances_count(&self, filter: &InstanceFilter) -> AppResult<i64> {
        let query = format!(
            "SELECT COUNT(*) FROM book_instances bi {}",
            filter.where_clause()
        );
        let mut builder = sqlx::query_scalar::<_, i64>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(filter.status);
        bind_field!(filter.due_back);
        bind_field!(filter.borrower_id);

        Ok(builder.fetch_one(&self.pool).await?)
    }

    /// List one page of copies matching `filter`, ordered by due date
    pub async fn book_instances_list(
        &self,
        filter: &InstanceFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<BookInstance>> {
        let n = filter.bind_count();
        let query = format!(
            "{} {} {} LIMIT ${} OFFSET ${}",
            SELECT_INSTANCE,
            filter.where_clause(),
            ORDER_INSTANCE,
            n + 1,
            n + 2
        );
        let mut builder = sqlx::query_as::<_, BookInstance>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(filter.status);
        bind_field!(filter.due_back);
        bind_field!(filter.borrower_id);

        let rows = builder
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// All copies of one book
    pub async fn book_instances_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let query = format!("{} WHERE bi.book_id = $1 {}", SELECT_INSTANCE, ORDER_INSTANCE);
        let rows = sqlx::query_as::<_, BookInstance>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get copy by ID
    pub async fn book_instances_get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!("{} WHERE bi.id = $1", SELECT_INSTANCE);
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Create copy with a fresh UUID
    pub async fn book_instances_create(&self, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(data.due_back)
        .bind(data.status.unwrap_or_default())
        .bind(data.borrower_id)
        .execute(&self.pool)
        .await?;

        self.book_instances_get_by_id(id).await
    }

    /// Update copy
    pub async fn book_instances_update(&self, id: Uuid, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $1, due_back = $2, status = $3, borrower_id = $4
            WHERE id = $5
            "#,
        )
        .bind(data.book_id)
        .bind(data.due_back)
        .bind(data.status.unwrap_or_default())
        .bind(data.borrower_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        self.book_instances_get_by_id(id).await
    }

    /// Move a copy's due date
    pub async fn book_instances_set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        self.book_instances_get_by_id(id).await
    }

    /// Delete copy
    pub async fn book_instances_delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }
}
