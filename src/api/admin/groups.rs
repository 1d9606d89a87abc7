//! Admin permission and group endpoints. Groups are superuser territory.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::AuthenticatedUser,
    error::AppResult,
    models::permission::{CreateGroup, Group, Permission, SetPermissions},
    AppState,
};

/// Every declared permission
#[utoipa::path(
    get,
    path = "/admin/permissions",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Declared permissions", body = Vec<Permission>))
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Permission>>> {
    claims.require_staff()?;
    Ok(Json(state.services.permissions.list_permissions().await?))
}

#[utoipa::path(
    get,
    path = "/admin/groups",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Groups with their permissions", body = Vec<Group>))
)]
pub async fn list_groups(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Group>>> {
    claims.require_superuser()?;
    Ok(Json(state.services.permissions.list_groups().await?))
}

#[utoipa::path(
    get,
    path = "/admin/groups/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group", body = Group),
        (status = 404, description = "Group not found")
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Group>> {
    claims.require_superuser()?;
    Ok(Json(state.services.permissions.get_group(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/groups",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateGroup,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Unknown permission codename"),
        (status = 409, description = "Group name taken")
    )
)]
pub async fn create_group(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(group): Json<CreateGroup>,
) -> AppResult<(StatusCode, Json<Group>)> {
    claims.require_superuser()?;

    let created = state.services.permissions.create_group(group).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace the permissions of a group
#[utoipa::path(
    put,
    path = "/admin/groups/{id}/permissions",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Group ID")),
    request_body = SetPermissions,
    responses(
        (status = 200, description = "Group updated", body = Group),
        (status = 404, description = "Group not found")
    )
)]
pub async fn set_group_permissions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<SetPermissions>,
) -> AppResult<Json<Group>> {
    claims.require_superuser()?;
    Ok(Json(
        state
            .services
            .permissions
            .set_group_permissions(id, &request.permissions)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/groups/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Group ID")),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_superuser()?;

    state.services.permissions.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
