//! Admin user management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{AuthenticatedUser, PaginatedResponse},
    error::{AppError, AppResult},
    models::{
        permission::{SetGroups, SetPermissions},
        user::{CreateUser, SetPassword, UpdateUser, User, UserQuery, UserSummary},
    },
    services::users::validate_password,
    AppState,
};

use super::{page_for, paginated, USER_ADMIN};

const MODEL: &str = USER_ADMIN.model;

/// List users with search, filters and pagination
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Users change list", body = PaginatedResponse<UserSummary>),
        (status = 403, description = "Missing view permission")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<UserSummary>>> {
    claims.require_model_perm("view", MODEL)?;

    let page = page_for(&USER_ADMIN, query.page, query.per_page);
    let (users, total) = state.services.users.search_users(&query, page).await?;
    let media_url = &state.config.media.url;
    let items = users
        .into_iter()
        .map(|user| UserSummary::from_user(user, media_url))
        .collect();

    Ok(Json(paginated(items, total, page)))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    claims.require_model_perm("view", MODEL)?;

    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Create a user; email and password are mandatory here
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_model_perm("add", MODEL)?;
    if user.is_superuser == Some(true) {
        claims.require_superuser()?;
    }

    let email = user
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
    let password = user
        .password
        .as_deref()
        .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;
    validate_password(password, &user.username, Some(email))?;

    let created = state.services.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(user): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    claims.require_model_perm("change", MODEL)?;
    if user.is_superuser.is_some() {
        claims.require_superuser()?;
    }

    let updated = state.services.users.update_user(id, user).await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_model_perm("delete", MODEL)?;
    if id == claims.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }

    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set a user's password
#[utoipa::path(
    put,
    path = "/admin/users/{id}/password",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = SetPassword,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Password rejected by the password rules")
    )
)]
pub async fn set_password(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<SetPassword>,
) -> AppResult<StatusCode> {
    claims.require_model_perm("change", MODEL)?;

    state.services.users.set_password(id, &request.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Permissions granted directly to a user
#[utoipa::path(
    get,
    path = "/admin/users/{id}/permissions",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Permission codenames", body = Vec<String>))
)]
pub async fn get_permissions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<String>>> {
    claims.require_model_perm("view", MODEL)?;

    let permissions = state.services.permissions.user_permissions(id).await?;
    Ok(Json(permissions))
}

/// Replace the permissions granted directly to a user
#[utoipa::path(
    put,
    path = "/admin/users/{id}/permissions",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = SetPermissions,
    responses(
        (status = 200, description = "Permission codenames now granted", body = Vec<String>),
        (status = 400, description = "Unknown permission codename")
    )
)]
pub async fn set_permissions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<SetPermissions>,
) -> AppResult<Json<Vec<String>>> {
    claims.require_model_perm("change", MODEL)?;

    let permissions = state
        .services
        .permissions
        .set_user_permissions(id, &request.permissions)
        .await?;
    Ok(Json(permissions))
}

/// Groups a user belongs to
#[utoipa::path(
    get,
    path = "/admin/users/{id}/groups",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses((status = 200, description = "Group ids", body = Vec<i64>))
)]
pub async fn get_groups(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<i64>>> {
    claims.require_model_perm("view", MODEL)?;

    let groups = state.services.permissions.user_groups(id).await?;
    Ok(Json(groups))
}

/// Replace the groups a user belongs to
#[utoipa::path(
    put,
    path = "/admin/users/{id}/groups",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    request_body = SetGroups,
    responses(
        (status = 200, description = "Group ids now set", body = Vec<i64>),
        (status = 400, description = "Unknown group")
    )
)]
pub async fn set_groups(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<SetGroups>,
) -> AppResult<Json<Vec<i64>>> {
    claims.require_model_perm("change", MODEL)?;

    let groups = state
        .services
        .permissions
        .set_user_groups(id, &request.group_ids)
        .await?;
    Ok(Json(groups))
}
