//! Libraries repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::library::{Library, LibraryQuery, LibrarySummary},
};

use super::{like_pattern, order_by, Page};

const LIBRARY_SUMMARY: &str = r#"
    SELECT l.id, l.name,
           (SELECT COUNT(*) FROM library_books lb WHERE lb.library_id = l.id) AS book_count
    FROM libraries l
"#;

#[derive(Clone)]
pub struct LibrariesRepository {
    pool: Pool<Sqlite>,
}

impl LibrariesRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Library> {
        sqlx::query_as::<_, Library>("SELECT id, name FROM libraries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))
    }

    pub async fn get_summary(&self, id: i64) -> AppResult<LibrarySummary> {
        sqlx::query_as::<_, LibrarySummary>(&format!("{} WHERE l.id = ?", LIBRARY_SUMMARY))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))
    }

    /// All libraries carrying exactly this name
    pub async fn find_by_name(&self, name: &str) -> AppResult<Vec<Library>> {
        let libraries = sqlx::query_as::<_, Library>(
            "SELECT id, name FROM libraries WHERE name = ? ORDER BY id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(libraries)
    }

    pub async fn search(
        &self,
        query: &LibraryQuery,
        page: Page,
    ) -> AppResult<(Vec<LibrarySummary>, i64)> {
        let pattern = query.q.as_deref().map(like_pattern);
        let where_clause = if pattern.is_some() {
            "WHERE LOWER(l.name) LIKE ?"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM libraries l {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref pattern) = pattern {
            count_builder = count_builder.bind(pattern);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY {}, l.id LIMIT {} OFFSET {}",
            LIBRARY_SUMMARY,
            where_clause,
            order_by(
                query.ordering.as_deref(),
                &[("name", "l.name COLLATE NOCASE"), ("book_count", "book_count"), ("id", "l.id")],
                "l.name COLLATE NOCASE ASC"
            ),
            page.per_page,
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, LibrarySummary>(&select_query);
        if let Some(ref pattern) = pattern {
            select_builder = select_builder.bind(pattern);
        }
        let libraries = select_builder.fetch_all(&self.pool).await?;

        Ok((libraries, total))
    }

    /// Create a library holding the given books
    pub async fn create(&self, name: &str, book_ids: &[i64]) -> AppResult<Library> {
        let mut tx = self.pool.begin().await?;

        let library = sqlx::query_as::<_, Library>(
            "INSERT INTO libraries (name) VALUES (?) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        for book_id in book_ids {
            sqlx::query("INSERT OR IGNORE INTO library_books (library_id, book_id) VALUES (?, ?)")
                .bind(library.id)
                .bind(book_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(library)
    }

    /// Rename and/or replace the book set in one transaction
    pub async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        book_ids: Option<&[i64]>,
    ) -> AppResult<Library> {
        let mut tx = self.pool.begin().await?;

        let library = sqlx::query_as::<_, Library>(
            "UPDATE libraries SET name = COALESCE(?, name) WHERE id = ? RETURNING id, name",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))?;

        if let Some(book_ids) = book_ids {
            sqlx::query("DELETE FROM library_books WHERE library_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for book_id in book_ids {
                sqlx::query(
                    "INSERT OR IGNORE INTO library_books (library_id, book_id) VALUES (?, ?)",
                )
                .bind(id)
                .bind(book_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(library)
    }

    /// Delete a library; its librarian goes with it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM libraries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Library with id {} not found", id)));
        }
        Ok(())
    }
}
