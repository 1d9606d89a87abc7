//! Permissions and groups repository

use sqlx::{Pool, Row, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::permission::{Group, Permission},
};

#[derive(Clone)]
pub struct PermissionsRepository {
    pool: Pool<Sqlite>,
}

impl PermissionsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT codename, name, model FROM permissions ORDER BY model, codename",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    /// Codenames from `codenames` that are not declared
    pub async fn unknown_codenames(&self, codenames: &[String]) -> AppResult<Vec<String>> {
        let mut unknown = Vec::new();
        for codename in codenames {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM permissions WHERE codename = ?)")
                    .bind(codename)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                unknown.push(codename.clone());
            }
        }
        Ok(unknown)
    }

    /// Direct permissions plus permissions of every group the user is in
    pub async fn effective_for_user(&self, user_id: i64) -> AppResult<Vec<String>> {
        let codenames = sqlx::query_scalar::<_, String>(
            r#"
            SELECT codename FROM user_permissions WHERE user_id = ?
            UNION
            SELECT gp.codename FROM group_permissions gp
            JOIN user_groups ug ON ug.group_id = gp.group_id
            WHERE ug.user_id = ?
            ORDER BY codename
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(codenames)
    }

    pub async fn direct_for_user(&self, user_id: i64) -> AppResult<Vec<String>> {
        let codenames = sqlx::query_scalar::<_, String>(
            "SELECT codename FROM user_permissions WHERE user_id = ? ORDER BY codename",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(codenames)
    }

    pub async fn set_for_user(&self, user_id: i64, codenames: &[String]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_permissions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for codename in codenames {
            sqlx::query("INSERT OR IGNORE INTO user_permissions (user_id, codename) VALUES (?, ?)")
                .bind(user_id)
                .bind(codename)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn groups_for_user(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT group_id FROM user_groups WHERE user_id = ? ORDER BY group_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn set_groups_for_user(&self, user_id: i64, group_ids: &[i64]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_groups WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for group_id in group_ids {
            sqlx::query("INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(group_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, name FROM auth_groups ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut groups = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            groups.push(Group {
                id,
                name: row.get("name"),
                permissions: self.group_permissions(id).await?,
            });
        }
        Ok(groups)
    }

    pub async fn get_group(&self, id: i64) -> AppResult<Group> {
        let name: String = sqlx::query_scalar("SELECT name FROM auth_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group with id {} not found", id)))?;

        Ok(Group {
            id,
            name,
            permissions: self.group_permissions(id).await?,
        })
    }

    pub async fn group_exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM auth_groups WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn group_permissions(&self, group_id: i64) -> AppResult<Vec<String>> {
        let codenames = sqlx::query_scalar::<_, String>(
            "SELECT codename FROM group_permissions WHERE group_id = ? ORDER BY codename",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(codenames)
    }

    pub async fn create_group(&self, name: &str, codenames: &[String]) -> AppResult<Group> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar("INSERT INTO auth_groups (name) VALUES (?) RETURNING id")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

        for codename in codenames {
            sqlx::query("INSERT OR IGNORE INTO group_permissions (group_id, codename) VALUES (?, ?)")
                .bind(id)
                .bind(codename)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_group(id).await
    }

    pub async fn set_group_permissions(&self, group_id: i64, codenames: &[String]) -> AppResult<Group> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM group_permissions WHERE group_id = ?")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        for codename in codenames {
            sqlx::query("INSERT OR IGNORE INTO group_permissions (group_id, codename) VALUES (?, ?)")
                .bind(group_id)
                .bind(codename)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_group(group_id).await
    }

    pub async fn delete_group(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM auth_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Group with id {} not found", id)));
        }
        Ok(())
    }
}
