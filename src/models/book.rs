//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Custom permissions declared on the book model
pub const CAN_ADD_BOOK: &str = "can_add_book";
pub const CAN_CHANGE_BOOK: &str = "can_change_book";
pub const CAN_DELETE_BOOK: &str = "can_delete_book";

/// Book row as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub publication_year: Option<i32>,
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Book joined with its author, as listed on pages and in the admin
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookWithAuthor {
    pub id: i64,
    pub title: String,
    pub publication_year: Option<i32>,
    pub author_id: i64,
    pub author_name: String,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub author_id: i64,
    #[validate(range(min = 0, max = 9999, message = "Publication year is out of range"))]
    pub publication_year: Option<i32>,
}

/// Update book request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    pub author_id: Option<i64>,
    #[validate(range(min = 0, max = 9999, message = "Publication year is out of range"))]
    pub publication_year: Option<i32>,
}

/// Book edit form posted to the edit page, identifying the book in the body.
/// Fields are spelled out so the form can also arrive urlencoded.
#[derive(Debug, Deserialize)]
pub struct EditBook {
    pub id: i64,
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub publication_year: Option<i32>,
}

impl EditBook {
    /// Book id and the changes to apply to it
    pub fn into_update(self) -> (i64, UpdateBook) {
        (
            self.id,
            UpdateBook {
                title: self.title,
                author_id: self.author_id,
                publication_year: self.publication_year,
            },
        )
    }
}

/// Book query parameters for the admin change list
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Search in title and author name
    pub q: Option<String>,
    pub author_id: Option<i64>,
    pub publication_year: Option<i32>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
