//! User model and related types

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Letters, digits and @/./+/-/_ only
pub static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

/// Role of a user in the library; drives page gating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    Librarian,
    #[default]
    Member,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Librarian, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Librarian => "Librarian",
            Role::Member => "Member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "librarian" => Ok(Role::Librarian),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Internal row structure for database queries
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    id: i64,
    username: String,
    email: Option<String>,
    password: Option<String>,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
    profile_photo: Option<String>,
    role: String,
    is_staff: bool,
    is_superuser: bool,
    is_active: bool,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            profile_photo: row.profile_photo,
            role: row.role.parse().unwrap_or_default(),
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
            date_joined: row.date_joined,
            last_login: row.last_login,
        }
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// Hashed password (argon2); `None` means the password is unusable
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Path relative to the media root
    pub profile_photo: Option<String>,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Age in whole years on the given day
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let born = self.date_of_birth?;
        let mut age = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            age -= 1;
        }
        Some(age)
    }

    pub fn age(&self) -> Option<i32> {
        self.age_on(Utc::now().date_naive())
    }

    pub fn has_usable_password(&self) -> bool {
        self.password.is_some()
    }

    /// Lower-case the domain part of an address, keeping the local part as typed
    pub fn normalize_email(email: &str) -> String {
        let email = email.trim();
        match email.rsplit_once('@') {
            Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
            None => email.to_string(),
        }
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}

/// User as shown in the admin change list
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Age in years, `null` when no date of birth is recorded
    pub age: Option<i32>,
    /// Public URL of the profile photo thumbnail
    pub profile_photo_url: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl UserSummary {
    pub fn from_user(user: User, media_url: &str) -> Self {
        let age = user.age();
        UserSummary {
            id: user.id,
            profile_photo_url: user
                .profile_photo
                .as_deref()
                .map(|path| format!("{}/{}", media_url.trim_end_matches('/'), path)),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            age,
            is_staff: user.is_staff,
            is_active: user.is_active,
            date_joined: user.date_joined,
        }
    }
}

/// User query parameters for the admin change list
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Search in username, first name, last name and email
    pub q: Option<String>,
    pub role: Option<Role>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
    /// Joined on or after this date
    pub date_joined_from: Option<NaiveDate>,
    /// Joined on or before this date
    pub date_joined_to: Option<NaiveDate>,
    pub date_of_birth_from: Option<NaiveDate>,
    pub date_of_birth_to: Option<NaiveDate>,
    /// Column to order by, prefix with `-` for descending
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create user request; optional flags fall back to the factory defaults
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(
        length(max = 150, message = "Username must be at most 150 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits and @/./+/-/_")
    )]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub role: Option<Role>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

/// Update user request (admin)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(
        length(min = 1, max = 150),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits and @/./+/-/_")
    )]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub role: Option<Role>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}

/// Update own profile request (for authenticated users)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    /// First name
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    /// Last name
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    /// Email address (must be unique); `null` clears it
    #[validate(email(message = "Invalid email format"))]
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    /// Date of birth; `null` clears it
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub date_of_birth: Option<Option<NaiveDate>>,
    /// Current password (required to change password)
    pub current_password: Option<String>,
    /// New password
    pub new_password: Option<String>,
}

/// Self-service registration form
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits and @/./+/-/_")
    )]
    pub username: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match"))]
    pub password2: String,
}

/// Set password request (admin)
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPassword {
    pub password: String,
}

/// HTML forms send empty inputs as empty strings
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// JWT claims for authenticated sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i64,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Effective permission codenames when the claims were built
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, permissions: Vec<String>, iat: i64, exp: i64) -> Self {
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            permissions,
            exp,
            iat,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    /// Superusers hold every permission
    pub fn has_perm(&self, codename: &str) -> bool {
        self.is_superuser || self.permissions.iter().any(|p| p == codename)
    }

    /// Staff flag is the admin-site entry ticket
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff privileges required".to_string()))
        }
    }

    /// Model-level admin permission, e.g. `("change", "book")`
    pub fn require_model_perm(&self, action: &str, model: &str) -> Result<(), AppError> {
        self.require_staff()?;
        if self.has_perm(&format!("{}_{}", action, model)) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Permission {}_{} required",
                action, model
            )))
        }
    }

    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(AppError::Authorization("Superuser privileges required".to_string()))
        }
    }
}
