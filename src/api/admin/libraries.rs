//! Admin library endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{AuthenticatedUser, PaginatedResponse},
    error::AppResult,
    models::library::{CreateLibrary, LibraryDetail, LibraryQuery, LibrarySummary, UpdateLibrary},
    AppState,
};

use super::{page_for, paginated, LIBRARY_ADMIN};

const MODEL: &str = LIBRARY_ADMIN.model;

/// List libraries with their book counts
#[utoipa::path(
    get,
    path = "/admin/libraries",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(LibraryQuery),
    responses(
        (status = 200, description = "Libraries change list", body = PaginatedResponse<LibrarySummary>)
    )
)]
pub async fn list_libraries(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LibraryQuery>,
) -> AppResult<Json<PaginatedResponse<LibrarySummary>>> {
    claims.require_model_perm("view", MODEL)?;

    let page = page_for(&LIBRARY_ADMIN, query.page, query.per_page);
    let (libraries, total) = state.services.catalog.search_libraries(&query, page).await?;
    Ok(Json(paginated(libraries, total, page)))
}

#[utoipa::path(
    get,
    path = "/admin/libraries/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library with its books", body = LibraryDetail),
        (status = 404, description = "Library not found")
    )
)]
pub async fn get_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LibraryDetail>> {
    claims.require_model_perm("view", MODEL)?;
    Ok(Json(state.services.catalog.get_library(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/libraries",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = LibrarySummary),
        (status = 400, description = "Invalid input or unknown book ids")
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(library): Json<CreateLibrary>,
) -> AppResult<(StatusCode, Json<LibrarySummary>)> {
    claims.require_model_perm("add", MODEL)?;

    let created = state.services.catalog.create_library(library).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Rename a library and/or replace its book set
#[utoipa::path(
    put,
    path = "/admin/libraries/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Library ID")),
    request_body = UpdateLibrary,
    responses(
        (status = 200, description = "Library updated", body = LibrarySummary),
        (status = 404, description = "Library not found")
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(library): Json<UpdateLibrary>,
) -> AppResult<Json<LibrarySummary>> {
    claims.require_model_perm("change", MODEL)?;
    Ok(Json(state.services.catalog.update_library(id, library).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/libraries/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Library ID")),
    responses(
        (status = 204, description = "Library and its librarian deleted"),
        (status = 404, description = "Library not found")
    )
)]
pub async fn delete_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_model_perm("delete", MODEL)?;

    state.services.catalog.delete_library(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
