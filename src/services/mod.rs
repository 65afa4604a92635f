//! Business logic services

pub mod catalog;
pub mod loans;
pub mod redis;
pub mod users;

use chrono::NaiveDate;

use crate::{
    config::AppConfig,
    error::AppError,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub redis: redis::RedisService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig, redis_service: redis::RedisService) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), config.catalog.clone()),
            loans: loans::LoansService::new(repository.clone(), config.catalog.clone()),
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            redis: redis_service,
            repository,
        }
    }
}

/// Server-local calendar date used for due-date comparisons
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// A missing referenced row is invalid input; any other failure passes through
fn unknown_reference(message: String) -> impl FnOnce(AppError) -> AppError {
    move |e| match e {
        AppError::NotFound(_) => AppError::Validation(message),
        other => other,
    }
}
