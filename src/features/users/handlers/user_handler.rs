use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::users::dtos::{SetBanDto, SetRoleDto, UserResponseDto};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let me = service.get_me(&user).await?;
    Ok(Json(ApiResponse::success(Some(me), None, None)))
}

/// List all users (administrator only)
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let users = service.list(&user).await?;
    let total = users.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(users),
        None,
        Some(Meta { total }),
    )))
}

/// Ban or unban a user (administrator only)
#[utoipa::path(
    put,
    path = "/api/users/{id}/ban",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = SetBanDto,
    responses(
        (status = 200, description = "Ban flag updated", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn set_ban(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SetBanDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let updated = service.set_banned(&user, id, dto.banned).await?;
    Ok(Json(ApiResponse::success(Some(updated), None, None)))
}

/// Change a user's role (administrator only)
#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = SetRoleDto,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<UserResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Administrator access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn set_role(
    user: AuthenticatedUser,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<SetRoleDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let updated = service.set_role(&user, id, dto.role).await?;
    Ok(Json(ApiResponse::success(Some(updated), None, None)))
}
