//! Catalog lookups by author or library name

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::{book::BookWithAuthor, librarian::LibrarianDetails, library::LibraryDetail},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Debug, Deserialize, IntoParams)]
pub struct NameQuery {
    /// Exact name to look up
    pub name: String,
}

/// All books by the named author
#[utoipa::path(
    get,
    path = "/catalog/authors/books",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(NameQuery),
    responses(
        (status = 200, description = "Books by the author", body = Vec<BookWithAuthor>),
        (status = 404, description = "No author with that name")
    )
)]
pub async fn books_by_author(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<NameQuery>,
) -> AppResult<Json<Vec<BookWithAuthor>>> {
    let books = state.services.catalog.books_by_author_name(&query.name).await?;
    Ok(Json(books))
}

/// Books held by the named library
#[utoipa::path(
    get,
    path = "/catalog/libraries/books",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(NameQuery),
    responses(
        (status = 200, description = "Library with its books", body = LibraryDetail),
        (status = 404, description = "No library with that name")
    )
)]
pub async fn books_in_library(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<NameQuery>,
) -> AppResult<Json<LibraryDetail>> {
    let library = state.services.catalog.books_in_library(&query.name).await?;
    Ok(Json(library))
}

/// Librarian of the named library
#[utoipa::path(
    get,
    path = "/catalog/libraries/librarian",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(NameQuery),
    responses(
        (status = 200, description = "Librarian of the library", body = LibrarianDetails),
        (status = 404, description = "No such library or no librarian assigned")
    )
)]
pub async fn librarian_of_library(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<NameQuery>,
) -> AppResult<Json<LibrarianDetails>> {
    let librarian = state.services.catalog.librarian_for_library(&query.name).await?;
    Ok(Json(librarian))
}
