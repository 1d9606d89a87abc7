//! Librarians repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::librarian::{CreateLibrarian, Librarian, LibrarianDetails, LibrarianQuery, UpdateLibrarian},
};

use super::{like_pattern, order_by, Page};

const LIBRARIAN_DETAILS: &str = r#"
    SELECT lr.id, lr.name, lr.library_id, l.name AS library_name, lr.user_id, u.username
    FROM librarians lr
    JOIN libraries l ON l.id = lr.library_id
    LEFT JOIN users u ON u.id = lr.user_id
"#;

#[derive(Clone)]
pub struct LibrariansRepository {
    pool: Pool<Sqlite>,
}

impl LibrariansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<LibrarianDetails> {
        sqlx::query_as::<_, LibrarianDetails>(&format!("{} WHERE lr.id = ?", LIBRARIAN_DETAILS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Librarian with id {} not found", id)))
    }

    pub async fn get_by_library(&self, library_id: i64) -> AppResult<Option<LibrarianDetails>> {
        let librarian = sqlx::query_as::<_, LibrarianDetails>(&format!(
            "{} WHERE lr.library_id = ?",
            LIBRARIAN_DETAILS
        ))
        .bind(library_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(librarian)
    }

    /// Librarian already assigned to the library, other than `exclude_id`
    pub async fn library_taken(&self, library_id: i64, exclude_id: Option<i64>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM librarians WHERE library_id = ? AND id != ?)",
        )
        .bind(library_id)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Librarian already linked to the user, other than `exclude_id`
    pub async fn user_taken(&self, user_id: i64, exclude_id: Option<i64>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM librarians WHERE user_id = ? AND id != ?)",
        )
        .bind(user_id)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn search(
        &self,
        query: &LibrarianQuery,
        page: Page,
    ) -> AppResult<(Vec<LibrarianDetails>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref q) = query.q {
            let pattern = like_pattern(q);
            conditions.push(
                "(LOWER(lr.name) LIKE ? OR LOWER(l.name) LIKE ? OR LOWER(IFNULL(u.username, '')) LIKE ?)"
                    .to_string(),
            );
            params.extend(std::iter::repeat(pattern).take(3));
        }

        if let Some(library_id) = query.library_id {
            conditions.push(format!("lr.library_id = {}", library_id));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!(
            "SELECT COUNT(*) FROM librarians lr \
             JOIN libraries l ON l.id = lr.library_id \
             LEFT JOIN users u ON u.id = lr.user_id {}",
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "{} {} ORDER BY {}, lr.id LIMIT {} OFFSET {}",
            LIBRARIAN_DETAILS,
            where_clause,
            order_by(
                query.ordering.as_deref(),
                &[
                    ("name", "lr.name COLLATE NOCASE"),
                    ("library", "l.name COLLATE NOCASE"),
                    ("user", "u.username COLLATE NOCASE"),
                ],
                "lr.name COLLATE NOCASE ASC"
            ),
            page.per_page,
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, LibrarianDetails>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let librarians = select_builder.fetch_all(&self.pool).await?;

        Ok((librarians, total))
    }

    pub async fn create(&self, librarian: &CreateLibrarian) -> AppResult<Librarian> {
        let created = sqlx::query_as::<_, Librarian>(
            r#"
            INSERT INTO librarians (name, library_id, user_id) VALUES (?, ?, ?)
            RETURNING id, name, library_id, user_id
            "#,
        )
        .bind(&librarian.name)
        .bind(librarian.library_id)
        .bind(librarian.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update(&self, id: i64, librarian: &UpdateLibrarian) -> AppResult<Librarian> {
        // user_id: absent keeps the link, null clears it
        let (touch_user, user_id) = match librarian.user_id {
            Some(user_id) => (true, user_id),
            None => (false, None),
        };

        sqlx::query_as::<_, Librarian>(
            r#"
            UPDATE librarians SET
                name = COALESCE(?, name),
                library_id = COALESCE(?, library_id),
                user_id = CASE WHEN ? THEN ? ELSE user_id END
            WHERE id = ?
            RETURNING id, name, library_id, user_id
            "#,
        )
        .bind(&librarian.name)
        .bind(librarian.library_id)
        .bind(touch_user)
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Librarian with id {} not found", id)))
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM librarians WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Librarian with id {} not found", id)));
        }
        Ok(())
    }
}
