//! Home page summary endpoint

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;

/// Cookie identifying a browser session for the visit counter
pub const SESSION_COOKIE: &str = "catalog_session";

/// Home page counters
#[derive(Serialize, ToSchema)]
pub struct HomeResponse {
    pub number_of_books: i64,
    /// Books whose title contains the configured highlight word
    pub number_of_books_with_word: i64,
    pub number_of_book_instances: i64,
    pub number_of_available_book_instances: i64,
    pub number_of_authors: i64,
    /// Visits by this session before the current one
    pub number_of_visits: i64,
}

/// Catalog summary for the home page
#[utoipa::path(
    get,
    path = "/home",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog counters", body = HomeResponse)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<HomeResponse>)> {
    let existing = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let (jar, session_id) = match existing {
        Some(id) => (jar, id),
        None => {
            let id = Uuid::new_v4().to_string();
            let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
                .path("/")
                .http_only(true);
            (jar.add(cookie), id)
        }
    };

    let counts = state.services.catalog.counts().await?;

    let number_of_visits = state
        .services
        .redis
        .record_visit(&session_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Visit counter unavailable: {}", e);
            0
        });

    Ok((
        jar,
        Json(HomeResponse {
            number_of_books: counts.books,
            number_of_books_with_word: counts.books_with_word,
            number_of_book_instances: counts.book_instances,
            number_of_available_book_instances: counts.available_book_instances,
            number_of_authors: counts.authors,
            number_of_visits,
        }),
    ))
}
