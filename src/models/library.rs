//! Library model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::BookWithAuthor;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Library {
    pub id: i64,
    pub name: String,
}

/// Library with the number of books it holds
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LibrarySummary {
    pub id: i64,
    pub name: String,
    pub book_count: i64,
}

/// Library with its books and their authors
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LibraryDetail {
    pub id: i64,
    pub name: String,
    pub books: Vec<BookWithAuthor>,
}

/// Create library request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLibrary {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
    #[serde(default)]
    pub book_ids: Vec<i64>,
}

/// Update library request; `book_ids` replaces the whole book set when present
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLibrary {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,
    pub book_ids: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LibraryQuery {
    /// Search in name
    pub q: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
