//! Book instance (loanable copy) model and related types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Availability of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    /// Single-letter code stored in the database
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus (stored as its one-letter code)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_code(), buf)
    }
}

/// Copy row joined with its book title and borrower login
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
}

impl BookInstance {
    /// A copy is overdue once its due date is strictly in the past
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.due_back, Some(due_back) if today > due_back)
    }

    pub fn into_details(self, today: NaiveDate) -> BookInstanceDetails {
        let is_overdue = self.is_overdue(today);
        BookInstanceDetails {
            display: self.to_string(),
            id: self.id,
            book_id: self.book_id,
            book_title: self.book_title,
            due_back: self.due_back,
            status: self.status,
            status_label: self.status.label().to_string(),
            borrower_id: self.borrower_id,
            borrower_username: self.borrower_username,
            is_overdue,
        }
    }
}

impl std::fmt::Display for BookInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.book_title)
    }
}

/// Copy as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookInstanceDetails {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    /// "{id} ({title})"
    pub display: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub status_label: String,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
    pub is_overdue: bool,
}

/// Create or update copy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookInstanceInput {
    pub book_id: i32,
    pub due_back: Option<NaiveDate>,
    /// Book availability, maintenance when omitted
    pub status: Option<LoanStatus>,
    pub borrower_id: Option<i32>,
}

/// Copy list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookInstanceQuery {
    pub status: Option<LoanStatus>,
    pub due_back: Option<NaiveDate>,
    pub page: Option<i64>,
}

/// Renewal form submission
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenewalRequest {
    /// Enter a date between now and 4 weeks (default 3)
    pub renewal_date: NaiveDate,
}

/// Renewal form as presented to the librarian
#[derive(Debug, Serialize, ToSchema)]
pub struct RenewalForm {
    pub book_instance: BookInstanceDetails,
    pub proposed_renewal_date: NaiveDate,
}

/// Date offered by default on the renewal form
pub fn proposed_renewal_date(today: NaiveDate, renewal_weeks: i64) -> NaiveDate {
    today + Duration::weeks(renewal_weeks)
}

/// Renewal dates must fall between today and `max_weeks` from today, inclusive
pub fn validate_renewal_date(date: NaiveDate, today: NaiveDate, max_weeks: i64) -> AppResult<()> {
    if date < today {
        return Err(AppError::Validation("Invalid date - renewal in past".to_string()));
    }
    if date > today + Duration::weeks(max_weeks) {
        return Err(AppError::Validation(format!(
            "Invalid date - renewal more than {} weeks ahead",
            max_weeks
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn copy(due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::nil(),
            book_id: 1,
            book_title: "Cyberpunk".to_string(),
            due_back,
            status: LoanStatus::OnLoan,
            borrower_id: Some(1),
            borrower_username: Some("testuser1".to_string()),
        }
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2024, 5, 10);
        assert!(copy(Some(date(2024, 5, 9))).is_overdue(today));
        assert!(!copy(Some(today)).is_overdue(today));
        assert!(!copy(Some(date(2024, 5, 11))).is_overdue(today));
        assert!(!copy(None).is_overdue(today));
    }

    #[test]
    fn test_display_includes_title() {
        let details = copy(None).into_details(date(2024, 1, 1));
        assert_eq!(details.display, format!("{} (Cyberpunk)", Uuid::nil()));
        assert_eq!(details.status_label, "On loan");
    }

    #[test]
    fn test_status_codes() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.as_code().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("x".parse::<LoanStatus>().is_err());
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
        assert_eq!(serde_json::to_string(&LoanStatus::OnLoan).unwrap(), "\"o\"");
    }

    #[test]
    fn test_proposed_renewal_is_three_weeks_out() {
        assert_eq!(proposed_renewal_date(date(2024, 5, 10), 3), date(2024, 5, 31));
    }

    #[test]
    fn test_renewal_date_bounds() {
        let today = date(2024, 5, 10);
        assert!(validate_renewal_date(today, today, 4).is_ok());
        assert!(validate_renewal_date(date(2024, 6, 7), today, 4).is_ok());

        let past = validate_renewal_date(date(2024, 5, 3), today, 4).unwrap_err();
        assert_eq!(past.to_string(), "Validation error: Invalid date - renewal in past");

        let far = validate_renewal_date(date(2024, 6, 14), today, 4).unwrap_err();
        assert_eq!(
            far.to_string(),
            "Validation error: Invalid date - renewal more than 4 weeks ahead"
        );
    }
}
