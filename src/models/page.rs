//! Page-number pagination shared by every list endpoint

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// `?page=N` query parameter (1-based)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// A resolved page within a result set of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
}

impl Pagination {
    /// Resolve `page` against `total` rows. Page 1 always exists, even for an
    /// empty result; any other page outside `1..=num_pages` is not found.
    pub fn new(page: Option<i64>, per_page: i64, total: i64) -> AppResult<Self> {
        let per_page = per_page.max(1);
        let page = page.unwrap_or(1);
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        if page < 1 || page > num_pages {
            return Err(AppError::NotFound(format!("Invalid page ({})", page)));
        }

        Ok(Self {
            page,
            per_page,
            total,
            num_pages,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eleven_rows_two_pages() {
        let first = Pagination::new(None, 10, 11).unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.num_pages, 2);
        assert_eq!(first.offset(), 0);
        assert!(first.is_paginated());

        let second = Pagination::new(Some(2), 10, 11).unwrap();
        assert_eq!(second.offset(), 10);
        assert_eq!(second.limit(), 10);
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let page = Pagination::new(Some(1), 10, 0).unwrap();
        assert_eq!(page.num_pages, 1);
        assert!(!page.is_paginated());
    }

    #[test]
    fn test_out_of_range_page_is_not_found() {
        assert!(matches!(Pagination::new(Some(3), 10, 11), Err(AppError::NotFound(_))));
        assert!(matches!(Pagination::new(Some(0), 10, 11), Err(AppError::NotFound(_))));
        assert!(matches!(Pagination::new(Some(2), 10, 0), Err(AppError::NotFound(_))));
    }
}
