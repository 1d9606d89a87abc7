//! Librarian model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Librarian {
    pub id: i64,
    pub name: String,
    pub library_id: i64,
    pub user_id: Option<i64>,
}

/// Librarian with library name and linked username
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LibrarianDetails {
    pub id: i64,
    pub name: String,
    pub library_id: i64,
    pub library_name: String,
    pub user_id: Option<i64>,
    pub username: Option<String>,
}

/// Create librarian request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLibrarian {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
    pub library_id: i64,
    pub user_id: Option<i64>,
}

/// Update librarian request; `user_id: null` unlinks the user account
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateLibrarian {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,
    pub library_id: Option<i64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<Option<i64>>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LibrarianQuery {
    /// Search in name, library name and username
    pub q: Option<String>,
    pub library_id: Option<i64>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
