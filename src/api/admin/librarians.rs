//! Admin librarian endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{AuthenticatedUser, PaginatedResponse},
    error::AppResult,
    models::librarian::{CreateLibrarian, Librarian, LibrarianDetails, LibrarianQuery, UpdateLibrarian},
    AppState,
};

use super::{page_for, paginated, LIBRARIAN_ADMIN};

const MODEL: &str = LIBRARIAN_ADMIN.model;

/// List librarians with their library and user
#[utoipa::path(
    get,
    path = "/admin/librarians",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(LibrarianQuery),
    responses(
        (status = 200, description = "Librarians change list", body = PaginatedResponse<LibrarianDetails>)
    )
)]
pub async fn list_librarians(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LibrarianQuery>,
) -> AppResult<Json<PaginatedResponse<LibrarianDetails>>> {
    claims.require_model_perm("view", MODEL)?;

    let page = page_for(&LIBRARIAN_ADMIN, query.page, query.per_page);
    let (librarians, total) = state.services.catalog.search_librarians(&query, page).await?;
    Ok(Json(paginated(librarians, total, page)))
}

#[utoipa::path(
    get,
    path = "/admin/librarians/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Librarian ID")),
    responses(
        (status = 200, description = "Librarian", body = LibrarianDetails),
        (status = 404, description = "Librarian not found")
    )
)]
pub async fn get_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LibrarianDetails>> {
    claims.require_model_perm("view", MODEL)?;
    Ok(Json(state.services.catalog.get_librarian(id).await?))
}

/// Assign a librarian to a library
#[utoipa::path(
    post,
    path = "/admin/librarians",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateLibrarian,
    responses(
        (status = 201, description = "Librarian created", body = Librarian),
        (status = 404, description = "Library or user not found"),
        (status = 409, description = "Library already staffed or user already a librarian")
    )
)]
pub async fn create_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(librarian): Json<CreateLibrarian>,
) -> AppResult<(StatusCode, Json<Librarian>)> {
    claims.require_model_perm("add", MODEL)?;

    let created = state.services.catalog.create_librarian(librarian).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/admin/librarians/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Librarian ID")),
    request_body = UpdateLibrarian,
    responses(
        (status = 200, description = "Librarian updated", body = Librarian),
        (status = 404, description = "Librarian not found"),
        (status = 409, description = "Library already staffed or user already a librarian")
    )
)]
pub async fn update_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(librarian): Json<UpdateLibrarian>,
) -> AppResult<Json<Librarian>> {
    claims.require_model_perm("change", MODEL)?;
    Ok(Json(state.services.catalog.update_librarian(id, librarian).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/librarians/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Librarian ID")),
    responses(
        (status = 204, description = "Librarian deleted"),
        (status = 404, description = "Librarian not found")
    )
)]
pub async fn delete_librarian(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_model_perm("delete", MODEL)?;

    state.services.catalog.delete_librarian(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
