//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{BookDetail, BookInput},
        page::PageQuery,
    },
};

use super::{AuthenticatedUser, BookPage, PaginatedResponse};

/// List books ordered by title, with authors and genres rendered
#[utoipa::path(
    get,
    path = "/books",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = BookPage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookPage>> {
    let (books, pagination) = state.services.catalog.list_books(query.page).await?;
    Ok(Json(PaginatedResponse::new(books, pagination)))
}

/// Get book with authors, genres, language and copies
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create book
#[utoipa::path(
    post,
    path = "/books",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = BookDetail),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "ISBN already used")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<BookInput>,
) -> AppResult<(StatusCode, Json<BookDetail>)> {
    claims.require_mark_returned()?;
    let book = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = BookDetail),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN already used")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<BookInput>,
) -> AppResult<Json<BookDetail>> {
    claims.require_mark_returned()?;
    let book = state.services.catalog.update_book(id, data).await?;
    Ok(Json(book))
}

/// Delete book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 422, description = "Book still has copies")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_mark_returned()?;
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
