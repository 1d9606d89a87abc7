//! Admin author endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{AuthenticatedUser, PaginatedResponse},
    error::AppResult,
    models::author::{Author, AuthorQuery, CreateAuthor, UpdateAuthor},
    AppState,
};

use super::{page_for, paginated, AUTHOR_ADMIN};

const MODEL: &str = AUTHOR_ADMIN.model;

/// List authors
#[utoipa::path(
    get,
    path = "/admin/authors",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(AuthorQuery),
    responses(
        (status = 200, description = "Authors change list", body = PaginatedResponse<Author>)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AuthorQuery>,
) -> AppResult<Json<PaginatedResponse<Author>>> {
    claims.require_model_perm("view", MODEL)?;

    let page = page_for(&AUTHOR_ADMIN, query.page, query.per_page);
    let (authors, total) = state.services.catalog.search_authors(&query, page).await?;
    Ok(Json(paginated(authors, total, page)))
}

#[utoipa::path(
    get,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Author>> {
    claims.require_model_perm("view", MODEL)?;
    Ok(Json(state.services.catalog.get_author(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/authors",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(author): Json<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    claims.require_model_perm("add", MODEL)?;

    let created = state.services.catalog.create_author(author).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author ID")),
    request_body = UpdateAuthor,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(author): Json<UpdateAuthor>,
) -> AppResult<Json<Author>> {
    claims.require_model_perm("change", MODEL)?;
    Ok(Json(state.services.catalog.update_author(id, author).await?))
}

/// Delete an author and every book they wrote
#[utoipa::path(
    delete,
    path = "/admin/authors/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_model_perm("delete", MODEL)?;

    state.services.catalog.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
