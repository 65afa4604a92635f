//! Language endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        language::{Language, LanguageInput},
        page::PageQuery,
    },
};

use super::{AuthenticatedUser, LanguagePage, PaginatedResponse};

/// List languages
#[utoipa::path(
    get,
    path = "/languages",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of languages", body = LanguagePage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_languages(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<LanguagePage>> {
    let (languages, pagination) = state.services.catalog.list_languages(query.page).await?;
    Ok(Json(PaginatedResponse::new(languages, pagination)))
}

/// Get language by ID
#[utoipa::path(
    get,
    path = "/languages/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 200, description = "Language", body = Language),
        (status = 404, description = "Language not found")
    )
)]
pub async fn get_language(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Language>> {
    let language = state.services.catalog.get_language(id).await?;
    Ok(Json(language))
}

/// Create language
#[utoipa::path(
    post,
    path = "/languages",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = LanguageInput,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 409, description = "Language already exists")
    )
)]
pub async fn create_language(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<LanguageInput>,
) -> AppResult<(StatusCode, Json<Language>)> {
    claims.require_mark_returned()?;
    let language = state.services.catalog.create_language(data).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

/// Update language
#[utoipa::path(
    put,
    path = "/languages/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    request_body = LanguageInput,
    responses(
        (status = 200, description = "Language updated", body = Language),
        (status = 404, description = "Language not found"),
        (status = 409, description = "Language already exists")
    )
)]
pub async fn update_language(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<LanguageInput>,
) -> AppResult<Json<Language>> {
    claims.require_mark_returned()?;
    let language = state.services.catalog.update_language(id, data).await?;
    Ok(Json(language))
}

/// Delete language
#[utoipa::path(
    delete,
    path = "/languages/{id}",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 204, description = "Language deleted"),
        (status = 404, description = "Language not found")
    )
)]
pub async fn delete_language(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_mark_returned()?;
    state.services.catalog.delete_language(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
