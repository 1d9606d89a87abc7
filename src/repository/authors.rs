//! Authors repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorQuery},
};

use super::{like_pattern, order_by, Page};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Sqlite>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    pub async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// All authors carrying exactly this name
    pub async fn find_by_name(&self, name: &str) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, name FROM authors WHERE name = ? ORDER BY id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    pub async fn search(&self, query: &AuthorQuery, page: Page) -> AppResult<(Vec<Author>, i64)> {
        let pattern = query.q.as_deref().map(like_pattern);
        let where_clause = if pattern.is_some() {
            "WHERE LOWER(name) LIKE ?"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM authors {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(ref pattern) = pattern {
            count_builder = count_builder.bind(pattern);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT id, name FROM authors {} ORDER BY {}, id LIMIT {} OFFSET {}",
            where_clause,
            order_by(
                query.ordering.as_deref(),
                &[("name", "name COLLATE NOCASE"), ("id", "id")],
                "name COLLATE NOCASE ASC"
            ),
            page.per_page,
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, Author>(&select_query);
        if let Some(ref pattern) = pattern {
            select_builder = select_builder.bind(pattern);
        }
        let authors = select_builder.fetch_all(&self.pool).await?;

        Ok((authors, total))
    }

    pub async fn create(&self, name: &str) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name) VALUES (?) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    pub async fn update(&self, id: i64, name: &str) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("UPDATE authors SET name = ? WHERE id = ? RETURNING id, name")
            .bind(name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Delete an author together with their books
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        Ok(())
    }
}
