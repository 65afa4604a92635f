//! Copy and loan endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{
            BookInstanceDetails, BookInstanceInput, BookInstanceQuery, RenewalForm, RenewalRequest,
        },
        page::PageQuery,
    },
};

use super::{AuthenticatedUser, BookInstancePage, PaginatedResponse};

/// List all copies, filterable by status and due date
#[utoipa::path(
    get,
    path = "/bookinstances",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(BookInstanceQuery),
    responses(
        (status = 200, description = "One page of copies", body = BookInstancePage),
        (status = 403, description = "Permission required")
    )
)]
pub async fn list_book_instances(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookInstanceQuery>,
) -> AppResult<Json<BookInstancePage>> {
    claims.require_mark_returned()?;
    let (copies, pagination) = state.services.loans.list_instances(&query).await?;
    Ok(Json(PaginatedResponse::new(copies, pagination)))
}

/// Get copy by ID
#[utoipa::path(
    get,
    path = "/bookinstances/{id}",
    tag = "loans",
    params(("id" = Uuid, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy details", body = BookInstanceDetails),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn get_book_instance(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    let copy = state.services.loans.get_instance(id).await?;
    Ok(Json(copy))
}

/// Create copy
#[utoipa::path(
    post,
    path = "/bookinstances",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BookInstanceInput,
    responses(
        (status = 201, description = "Copy created", body = BookInstanceDetails),
        (status = 400, description = "Unknown book or borrower")
    )
)]
pub async fn create_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<BookInstanceInput>,
) -> AppResult<(StatusCode, Json<BookInstanceDetails>)> {
    claims.require_mark_returned()?;
    let copy = state.services.loans.create_instance(data).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Update copy
#[utoipa::path(
    put,
    path = "/bookinstances/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    request_body = BookInstanceInput,
    responses(
        (status = 200, description = "Copy updated", body = BookInstanceDetails),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn update_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<BookInstanceInput>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_mark_returned()?;
    let copy = state.services.loans.update_instance(id, data).await?;
    Ok(Json(copy))
}

/// Delete copy
#[utoipa::path(
    delete,
    path = "/bookinstances/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn delete_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_mark_returned()?;
    state.services.loans.delete_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Borrowed copies, soonest due first", body = BookInstancePage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookInstancePage>> {
    let (copies, pagination) = state
        .services
        .loans
        .borrowed_by_user(claims.user_id, query.page)
        .await?;
    Ok(Json(PaginatedResponse::new(copies, pagination)))
}

/// Copies on loan to anyone
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Borrowed copies, soonest due first", body = BookInstancePage),
        (status = 403, description = "Permission required")
    )
)]
pub async fn all_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookInstancePage>> {
    claims.require_mark_returned()?;
    let (copies, pagination) = state.services.loans.borrowed_by_all(query.page).await?;
    Ok(Json(PaginatedResponse::new(copies, pagination)))
}

/// Renewal form with the proposed date
#[utoipa::path(
    get,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy and proposed renewal date", body = RenewalForm),
        (status = 403, description = "Permission required"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renewal_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalForm>> {
    claims.require_mark_returned()?;
    let form = state.services.loans.renewal_form(id).await?;
    Ok(Json(form))
}

/// Renew a copy until the given date
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    request_body = RenewalRequest,
    responses(
        (status = 200, description = "Copy renewed", body = BookInstanceDetails),
        (status = 400, description = "Renewal date out of range"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn renew_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewalRequest>,
) -> AppResult<Json<BookInstanceDetails>> {
    claims.require_mark_returned()?;
    let copy = state.services.loans.renew(id, request.renewal_date).await?;
    Ok(Json(copy))
}
