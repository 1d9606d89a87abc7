//! Admin book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::{AuthenticatedUser, PaginatedResponse},
    error::AppResult,
    models::book::{Book, BookQuery, BookWithAuthor, CreateBook, UpdateBook},
    AppState,
};

use super::{page_for, paginated, BOOK_ADMIN};

const MODEL: &str = BOOK_ADMIN.model;

/// List books, 25 per page unless asked otherwise
#[utoipa::path(
    get,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Books change list", body = PaginatedResponse<BookWithAuthor>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<BookWithAuthor>>> {
    claims.require_model_perm("view", MODEL)?;

    let page = page_for(&BOOK_ADMIN, query.page, query.per_page);
    let (books, total) = state.services.catalog.search_books(&query, page).await?;
    Ok(Json(paginated(books, total, page)))
}

#[utoipa::path(
    get,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book with its author", body = BookWithAuthor),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<BookWithAuthor>> {
    claims.require_model_perm("view", MODEL)?;
    Ok(Json(state.services.catalog.get_book(id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/books",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or unknown author")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_model_perm("add", MODEL)?;

    let created = state.services.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(book): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    claims.require_model_perm("change", MODEL)?;
    Ok(Json(state.services.catalog.update_book(id, book).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/books/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    claims.require_model_perm("delete", MODEL)?;

    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
