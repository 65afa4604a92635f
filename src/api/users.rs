//! User administration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdatePermissions, User, UserShort},
};

use super::AuthenticatedUser;

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<UserShort>),
        (status = 403, description = "Superuser required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserShort>>> {
    claims.require_superuser()?;
    let users = state.services.users.list_users().await?;
    Ok(Json(users))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_superuser()?;
    let user = state.services.users.create_user(data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Replace a user's permissions
#[utoipa::path(
    put,
    path = "/users/{id}/permissions",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdatePermissions,
    responses(
        (status = 200, description = "Permissions updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_permissions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdatePermissions>,
) -> AppResult<Json<User>> {
    claims.require_superuser()?;
    let user = state.services.users.set_permissions(id, &data.permissions).await?;
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_superuser()?;
    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
