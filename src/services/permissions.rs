//! Permission and group management

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::permission::{CreateGroup, Group, Permission},
    repository::Repository,
};

#[derive(Clone)]
pub struct PermissionsService {
    repository: Repository,
}

impl PermissionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.repository.permissions.list().await
    }

    pub async fn list_groups(&self) -> AppResult<Vec<Group>> {
        self.repository.permissions.list_groups().await
    }

    pub async fn get_group(&self, id: i64) -> AppResult<Group> {
        self.repository.permissions.get_group(id).await
    }

    pub async fn create_group(&self, group: CreateGroup) -> AppResult<Group> {
        group.validate()?;
        self.ensure_known(&group.permissions).await?;

        let created = self
            .repository
            .permissions
            .create_group(group.name.trim(), &group.permissions)
            .await?;
        tracing::info!(group_id = created.id, name = %created.name, "Group created");
        Ok(created)
    }

    pub async fn set_group_permissions(&self, id: i64, permissions: &[String]) -> AppResult<Group> {
        self.ensure_known(permissions).await?;
        if !self.repository.permissions.group_exists(id).await? {
            return Err(AppError::NotFound(format!("Group with id {} not found", id)));
        }
        self.repository.permissions.set_group_permissions(id, permissions).await
    }

    pub async fn delete_group(&self, id: i64) -> AppResult<()> {
        self.repository.permissions.delete_group(id).await
    }

    /// Permissions granted to the user directly, not through groups
    pub async fn user_permissions(&self, user_id: i64) -> AppResult<Vec<String>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.permissions.direct_for_user(user_id).await
    }

    pub async fn set_user_permissions(&self, user_id: i64, permissions: &[String]) -> AppResult<Vec<String>> {
        self.ensure_known(permissions).await?;
        self.repository.users.get_by_id(user_id).await?;
        self.repository.permissions.set_for_user(user_id, permissions).await?;
        tracing::info!(user_id, count = permissions.len(), "User permissions replaced");
        self.repository.permissions.direct_for_user(user_id).await
    }

    pub async fn user_groups(&self, user_id: i64) -> AppResult<Vec<i64>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.permissions.groups_for_user(user_id).await
    }

    pub async fn set_user_groups(&self, user_id: i64, group_ids: &[i64]) -> AppResult<Vec<i64>> {
        self.repository.users.get_by_id(user_id).await?;
        for &group_id in group_ids {
            if !self.repository.permissions.group_exists(group_id).await? {
                return Err(AppError::Validation(format!("Group with id {} does not exist", group_id)));
            }
        }

        self.repository.permissions.set_groups_for_user(user_id, group_ids).await?;
        self.repository.permissions.groups_for_user(user_id).await
    }

    async fn ensure_known(&self, codenames: &[String]) -> AppResult<()> {
        let unknown = self.repository.permissions.unknown_codenames(codenames).await?;
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Unknown permissions: {}", unknown.join(", "))))
        }
    }
}
