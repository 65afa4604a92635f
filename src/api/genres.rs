//! Genre endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        genre::{Genre, GenreInput},
        page::PageQuery,
    },
};

use super::{AuthenticatedUser, GenrePage, PaginatedResponse};

/// List genres
#[utoipa::path(
    get,
    path = "/genres",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of genres", body = GenrePage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_genres(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<GenrePage>> {
    let (genres, pagination) = state.services.catalog.list_genres(query.page).await?;
    Ok(Json(PaginatedResponse::new(genres, pagination)))
}

/// Get genre by ID
#[utoipa::path(
    get,
    path = "/genres/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre", body = Genre),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Genre>> {
    let genre = state.services.catalog.get_genre(id).await?;
    Ok(Json(genre))
}

/// Create genre
#[utoipa::path(
    post,
    path = "/genres",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = GenreInput,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 409, description = "Genre already exists")
    )
)]
pub async fn create_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<GenreInput>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    claims.require_mark_returned()?;
    let genre = state.services.catalog.create_genre(data).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

/// Update genre
#[utoipa::path(
    put,
    path = "/genres/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = GenreInput,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 404, description = "Genre not found"),
        (status = 409, description = "Genre already exists")
    )
)]
pub async fn update_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<GenreInput>,
) -> AppResult<Json<Genre>> {
    claims.require_mark_returned()?;
    let genre = state.services.catalog.update_genre(id, data).await?;
    Ok(Json(genre))
}

/// Delete genre
#[utoipa::path(
    delete,
    path = "/genres/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_mark_returned()?;
    state.services.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
