//! Permissions and groups

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Permission {
    pub codename: String,
    pub name: String,
    /// Model the permission belongs to
    pub model: String,
}

/// Named set of permissions that users can be members of
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGroup {
    #[validate(length(min = 1, max = 150, message = "Name must be 1 to 150 characters"))]
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Replace the permission codenames of a user or group
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPermissions {
    pub permissions: Vec<String>,
}

/// Replace the groups a user belongs to
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetGroups {
    pub group_ids: Vec<i64>,
}
