//! Books repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookWithAuthor, CreateBook, UpdateBook},
};

use super::{like_pattern, order_by, Page};

const BOOK_WITH_AUTHOR: &str = r#"
    SELECT b.id, b.title, b.publication_year, b.author_id, a.name AS author_name
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

const BOOK_ORDERING: &[(&str, &str)] = &[
    ("title", "b.title COLLATE NOCASE"),
    ("author", "a.name COLLATE NOCASE"),
    ("publication_year", "b.publication_year"),
    ("id", "b.id"),
];

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            "SELECT id, title, author_id, publication_year FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn get_with_author(&self, id: i64) -> AppResult<BookWithAuthor> {
        sqlx::query_as::<_, BookWithAuthor>(&format!("{} WHERE b.id = ?", BOOK_WITH_AUTHOR))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Every book with its author, ordered by title
    pub async fn list_with_authors(&self) -> AppResult<Vec<BookWithAuthor>> {
        let books = sqlx::query_as::<_, BookWithAuthor>(&format!(
            "{} ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_WITH_AUTHOR
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn list_by_author(&self, author_id: i64) -> AppResult<Vec<BookWithAuthor>> {
        let books = sqlx::query_as::<_, BookWithAuthor>(&format!(
            "{} WHERE b.author_id = ? ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_WITH_AUTHOR
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn list_by_library(&self, library_id: i64) -> AppResult<Vec<BookWithAuthor>> {
        let books = sqlx::query_as::<_, BookWithAuthor>(&format!(
            "{} JOIN library_books lb ON lb.book_id = b.id \
             WHERE lb.library_id = ? ORDER BY b.title COLLATE NOCASE, b.id",
            BOOK_WITH_AUTHOR
        ))
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Ids from `ids` that have no book row
    pub async fn missing_ids(&self, ids: &[i64]) -> AppResult<Vec<i64>> {
        let mut missing = Vec::new();
        for &id in ids {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                missing.push(id);
            }
        }
        Ok(missing)
    }

    /// Search books with filters, ordering and pagination
    pub async fn search(
        &self,
        query: &BookQuery,
        page: Page,
    ) -> AppResult<(Vec<BookWithAuthor>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref q) = query.q {
            let pattern = like_pattern(q);
            conditions.push("(LOWER(b.title) LIKE ? OR LOWER(a.name) LIKE ?)".to_string());
            params.push(pattern.clone());
            params.push(pattern);
        }

        if let Some(author_id) = query.author_id {
            conditions.push(format!("b.author_id = {}", author_id));
        }

        if let Some(year) = query.publication_year {
            conditions.push(format!("b.publication_year = {}", year));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!(
            "SELECT COUNT(*) FROM books b JOIN authors a ON a.id = b.author_id {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY {}, b.id LIMIT {} OFFSET {}",
            BOOK_WITH_AUTHOR,
            where_clause,
            order_by(
                query.ordering.as_deref(),
                BOOK_ORDERING,
                "b.title COLLATE NOCASE ASC"
            ),
            page.per_page,
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, BookWithAuthor>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, publication_year) VALUES (?, ?, ?)
            RETURNING id, title, author_id, publication_year
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.publication_year)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update(&self, id: i64, book: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE(?, title),
                author_id = COALESCE(?, author_id),
                publication_year = COALESCE(?, publication_year)
            WHERE id = ?
            RETURNING id, title, author_id, publication_year
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.publication_year)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book; it disappears from every library holding it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
