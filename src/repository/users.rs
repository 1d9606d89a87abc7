//! Users repository for database operations

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, UpdateProfile, UpdateUser, User, UserQuery, UserRow},
};

use super::{like_pattern, order_by, Page};

const USER_COLUMNS: &str = r#"
    id, username, email, password, first_name, last_name, date_of_birth,
    profile_photo, role, is_staff, is_superuser, is_active, date_joined, last_login
"#;

/// Orderable change-list columns
const USER_ORDERING: &[(&str, &str)] = &[
    ("username", "username COLLATE NOCASE"),
    ("email", "email COLLATE NOCASE"),
    ("first_name", "first_name COLLATE NOCASE"),
    ("last_name", "last_name COLLATE NOCASE"),
    ("role", "role"),
    ("is_staff", "is_staff"),
    ("is_active", "is_active"),
    ("date_joined", "date_joined"),
    ("date_of_birth", "date_of_birth"),
];

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Sqlite>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        Ok(row.into())
    }

    /// Get user by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = ? COLLATE NOCASE",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE AND id != ?)",
        )
        .bind(username)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE AND id != ?)",
        )
        .bind(email)
        .bind(exclude_id.unwrap_or(0))
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Search users with filters, ordering and pagination
    pub async fn search(&self, query: &UserQuery, page: Page) -> AppResult<(Vec<User>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref q) = query.q {
            let pattern = like_pattern(q);
            conditions.push(
                "(LOWER(username) LIKE ? OR LOWER(first_name) LIKE ? \
                 OR LOWER(last_name) LIKE ? OR LOWER(IFNULL(email, '')) LIKE ?)"
                    .to_string(),
            );
            params.extend(std::iter::repeat(pattern).take(4));
        }

        if let Some(role) = query.role {
            conditions.push("role = ?".to_string());
            params.push(role.as_str().to_string());
        }

        macro_rules! flag_filter {
            ($field:expr, $column:expr) => {
                if let Some(flag) = $field {
                    conditions.push(format!("{} = {}", $column, flag as i32));
                }
            };
        }

        flag_filter!(query.is_staff, "is_staff");
        flag_filter!(query.is_superuser, "is_superuser");
        flag_filter!(query.is_active, "is_active");

        // Inclusive date ranges; date_joined is an RFC 3339 timestamp
        let date_ranges = [
            ("substr(date_joined, 1, 10) >= ?", query.date_joined_from),
            ("substr(date_joined, 1, 10) <= ?", query.date_joined_to),
            ("date_of_birth >= ?", query.date_of_birth_from),
            ("date_of_birth <= ?", query.date_of_birth_to),
        ];
        for (condition, date) in date_ranges {
            if let Some(date) = date {
                conditions.push(condition.to_string());
                params.push(date.format("%Y-%m-%d").to_string());
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT {} FROM users {} ORDER BY {}, id LIMIT {} OFFSET {}",
            USER_COLUMNS,
            where_clause,
            order_by(
                query.ordering.as_deref(),
                USER_ORDERING,
                "username COLLATE NOCASE ASC"
            ),
            page.per_page,
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, UserRow>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let users = select_builder
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::from)
            .collect();

        Ok((users, total))
    }

    /// Create a new user; flags left unset take the column defaults
    pub async fn create(&self, user: &CreateUser, password: Option<String>) -> AppResult<User> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (
                username, email, password, first_name, last_name, date_of_birth,
                role, is_staff, is_superuser, is_active, date_joined
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&password)
        .bind(user.first_name.as_deref().unwrap_or(""))
        .bind(user.last_name.as_deref().unwrap_or(""))
        .bind(user.date_of_birth)
        .bind(user.role.unwrap_or_default().as_str())
        .bind(user.is_staff.unwrap_or(false))
        .bind(user.is_superuser.unwrap_or(false))
        .bind(user.is_active.unwrap_or(true))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Update an existing user (admin); only provided fields change
    pub async fn update(&self, id: i64, user: &UpdateUser) -> AppResult<User> {
        let mut sets: Vec<&str> = Vec::new();

        macro_rules! add_field {
            ($field:expr, $name:literal) => {
                if $field.is_some() {
                    sets.push(concat!($name, " = ?"));
                }
            };
        }

        add_field!(user.username, "username");
        add_field!(user.email, "email");
        add_field!(user.first_name, "first_name");
        add_field!(user.last_name, "last_name");
        add_field!(user.date_of_birth, "date_of_birth");
        add_field!(user.role, "role");
        add_field!(user.is_staff, "is_staff");
        add_field!(user.is_superuser, "is_superuser");
        add_field!(user.is_active, "is_active");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut builder = sqlx::query(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(user.username);
        bind_field!(user.email);
        bind_field!(user.first_name);
        bind_field!(user.last_name);
        bind_field!(user.date_of_birth);
        if let Some(role) = user.role {
            builder = builder.bind(role.as_str());
        }
        bind_field!(user.is_staff);
        bind_field!(user.is_superuser);
        bind_field!(user.is_active);

        let result = builder.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        self.get_by_id(id).await
    }

    /// Update own profile fields and optionally the password hash
    pub async fn update_profile(
        &self,
        id: i64,
        profile: &UpdateProfile,
        password: Option<String>,
    ) -> AppResult<User> {
        sqlx::query(
            r#"
            UPDATE users SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                email = CASE WHEN ? THEN ? ELSE email END,
                date_of_birth = CASE WHEN ? THEN ? ELSE date_of_birth END,
                password = COALESCE(?, password)
            WHERE id = ?
            "#,
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.email.is_some())
        .bind(profile.email.clone().flatten())
        .bind(profile.date_of_birth.is_some())
        .bind(profile.date_of_birth.flatten())
        .bind(&password)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Replace the password hash; `None` makes the password unusable
    pub async fn set_password(&self, id: i64, password: Option<String>) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(&password)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Store or clear the profile photo path
    pub async fn set_profile_photo(&self, id: i64, path: Option<&str>) -> AppResult<User> {
        sqlx::query("UPDATE users SET profile_photo = ? WHERE id = ?")
            .bind(path)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_by_id(id).await
    }

    /// Record a successful login
    pub async fn touch_last_login(&self, id: i64) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a user; librarian links, permissions and memberships cascade
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }
}
