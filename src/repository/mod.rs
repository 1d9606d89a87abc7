//! Repository layer for database operations

pub mod authors;
pub mod books;
pub mod librarians;
pub mod libraries;
pub mod permissions;
pub mod users;

use sqlx::{Pool, Sqlite};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub users: users::UsersRepository,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub libraries: libraries::LibrariesRepository,
    pub librarians: librarians::LibrariansRepository,
    pub permissions: permissions::PermissionsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            libraries: libraries::LibrariesRepository::new(pool.clone()),
            librarians: librarians::LibrariansRepository::new(pool.clone()),
            permissions: permissions::PermissionsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Page window for change lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    pub const MAX_PER_PAGE: i64 = 100;
    /// Highest page number accepted; keeps the row offset within i64
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_PER_PAGE;

    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// Build an ORDER BY expression from a user-supplied ordering such as
/// `title` or `-publication_year`. Only whitelisted fields are accepted;
/// anything else falls back to `default`. Callers append their own
/// primary-key tie-break.
pub fn order_by(ordering: Option<&str>, allowed: &[(&str, &str)], default: &str) -> String {
    let Some(ordering) = ordering.map(str::trim).filter(|o| !o.is_empty()) else {
        return default.to_string();
    };

    let (field, direction) = match ordering.strip_prefix('-') {
        Some(field) => (field, "DESC"),
        None => (ordering, "ASC"),
    };

    allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| format!("{} {}", column, direction))
        .unwrap_or_else(|| default.to_string())
}

/// `%term%` pattern for case-insensitive LIKE searches
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim().to_lowercase())
}
