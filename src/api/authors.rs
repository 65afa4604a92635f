//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetail, AuthorFormInitial, AuthorInput},
        page::PageQuery,
    },
};

use super::{AuthenticatedUser, AuthorPage, PaginatedResponse};

/// List authors ordered by last name, then first name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of authors", body = AuthorPage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AuthorPage>> {
    let (authors, pagination) = state.services.catalog.list_authors(query.page).await?;
    Ok(Json(PaginatedResponse::new(authors, pagination)))
}

/// Get author with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Initial values for the author creation form
#[utoipa::path(
    get,
    path = "/author-form",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Form defaults", body = AuthorFormInitial),
        (status = 403, description = "Permission required")
    )
)]
pub async fn author_form(
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AuthorFormInitial>> {
    claims.require_mark_returned()?;
    Ok(Json(AuthorFormInitial::default()))
}

/// Create author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = AuthorInput,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Permission required")
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<AuthorInput>,
) -> AppResult<(StatusCode, Json<Author>)> {
    claims.require_mark_returned()?;
    let author = state.services.catalog.create_author(data).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Update author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorInput,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<AuthorInput>,
) -> AppResult<Json<Author>> {
    claims.require_mark_returned()?;
    let author = state.services.catalog.update_author(id, data).await?;
    Ok(Json(author))
}

/// Delete author
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_mark_returned()?;
    state.services.catalog.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
