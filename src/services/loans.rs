//! Copy and loan management service

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config::CatalogConfig,
    error::AppResult,
    models::{
        book_instance::{
            proposed_renewal_date, validate_renewal_date, BookInstanceDetails, BookInstanceInput,
            BookInstanceQuery, RenewalForm,
        },
        page::Pagination,
    },
    repository::{book_instances::InstanceFilter, Repository},
};

use super::{today, unknown_reference};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: CatalogConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    async fn list(
        &self,
        filter: &InstanceFilter,
        page: Option<i64>,
    ) -> AppResult<(Vec<BookInstanceDetails>, Pagination)> {
        let total = self.repository.book_instances_count(filter).await?;
        let pagination = Pagination::new(page, self.config.page_size, total)?;
        let today = today();
        let copies = self
            .repository
            .book_instances_list(filter, pagination.limit(), pagination.offset())
            .await?
            .into_iter()
            .map(|copy| copy.into_details(today))
            .collect();
        Ok((copies, pagination))
    }

    /// All copies, filtered by status and due date
    pub async fn list_instances(
        &self,
        query: &BookInstanceQuery,
    ) -> AppResult<(Vec<BookInstanceDetails>, Pagination)> {
        let filter = InstanceFilter {
            status: query.status,
            due_back: query.due_back,
            borrower_id: None,
        };
        self.list(&filter, query.page).await
    }

    /// Copies on loan to one user, soonest due first
    pub async fn borrowed_by_user(
        &self,
        user_id: i32,
        page: Option<i64>,
    ) -> AppResult<(Vec<BookInstanceDetails>, Pagination)> {
        self.list(&InstanceFilter::on_loan(Some(user_id)), page).await
    }

    /// Every copy on loan, soonest due first
    pub async fn borrowed_by_all(
        &self,
        page: Option<i64>,
    ) -> AppResult<(Vec<BookInstanceDetails>, Pagination)> {
        self.list(&InstanceFilter::on_loan(None), page).await
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstanceDetails> {
        let copy = self.repository.book_instances_get_by_id(id).await?;
        Ok(copy.into_details(today()))
    }

    pub async fn create_instance(&self, data: BookInstanceInput) -> AppResult<BookInstanceDetails> {
        self.check_references(&data).await?;
        let copy = self.repository.book_instances_create(&data).await?;
        tracing::info!("Book instance created: {}", copy);
        Ok(copy.into_details(today()))
    }

    pub async fn update_instance(
        &self,
        id: Uuid,
        data: BookInstanceInput,
    ) -> AppResult<BookInstanceDetails> {
        self.repository.book_instances_get_by_id(id).await?;
        self.check_references(&data).await?;
        let copy = self.repository.book_instances_update(id, &data).await?;
        Ok(copy.into_details(today()))
    }

    pub async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances_delete(id).await
    }

    /// The copy and the date the renewal form proposes
    pub async fn renewal_form(&self, id: Uuid) -> AppResult<RenewalForm> {
        let today = today();
        let copy = self.repository.book_instances_get_by_id(id).await?;
        Ok(RenewalForm {
            book_instance: copy.into_details(today),
            proposed_renewal_date: proposed_renewal_date(today, self.config.renewal_weeks),
        })
    }

    /// Validate the renewal date and move the copy's due date to it
    pub async fn renew(&self, id: Uuid, renewal_date: NaiveDate) -> AppResult<BookInstanceDetails> {
        let today = today();
        self.repository.book_instances_get_by_id(id).await?;
        validate_renewal_date(renewal_date, today, self.config.max_renewal_weeks)?;

        let copy = self
            .repository
            .book_instances_set_due_back(id, renewal_date)
            .await?;
        tracing::info!("Book instance {} renewed until {}", copy, renewal_date);
        Ok(copy.into_details(today))
    }

    async fn check_references(&self, data: &BookInstanceInput) -> AppResult<()> {
        self.repository
            .books_get_by_id(data.book_id)
            .await
            .map_err(unknown_reference(format!("Unknown book {}", data.book_id)))?;
        if let Some(borrower_id) = data.borrower_id {
            self.repository
                .users_get_by_id(borrower_id)
                .await
                .map_err(unknown_reference(format!("Unknown borrower {}", borrower_id)))?;
        }
        Ok(())
    }
}
