//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        CreateUser, RegisterUser, Role, UpdateProfile, UpdateUser, User, UserClaims, UserQuery,
    },
    repository::{Page, Repository},
};

/// Smallest accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Passwords rejected outright
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "12345678", "123456789", "1234567890", "qwerty123",
    "iloveyou", "sunshine", "princess", "football", "baseball", "welcome1",
    "letmein1", "abc12345", "passw0rd", "trustno1", "11111111", "00000000",
];

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate by username and password and issue a session token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        if !user.is_active {
            return Err(AppError::Authentication("This account is inactive".to_string()));
        }

        self.repository.users.touch_last_login(user.id).await?;
        let token = self.create_token_for_user(&user).await?;

        tracing::info!(user_id = user.id, role = %user.role, "User logged in");
        Ok((token, user))
    }

    /// Direct and group permissions; active superusers hold all of them,
    /// inactive users none.
    pub async fn effective_permissions(&self, user: &User) -> AppResult<Vec<String>> {
        if !user.is_active {
            return Ok(Vec::new());
        }

        if user.is_superuser {
            let all = self.repository.permissions.list().await?;
            return Ok(all.into_iter().map(|p| p.codename).collect());
        }

        self.repository.permissions.effective_for_user(user.id).await
    }

    /// Create JWT token for a user, embedding their effective permissions
    pub async fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let permissions = self.effective_permissions(user).await?;

        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);
        let claims = UserClaims::for_user(user, permissions, now, exp);

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Claims for a decoded token, rebuilt from the stored user so that role,
    /// flags and permissions are current. `None` when the user is gone or
    /// inactive.
    pub async fn session_claims(&self, token: &UserClaims) -> AppResult<Option<UserClaims>> {
        let user = match self.repository.users.get_by_id(token.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        if !user.is_active {
            tracing::debug!(user_id = user.id, "Session of inactive user rejected");
            return Ok(None);
        }

        let permissions = self.effective_permissions(&user).await?;
        Ok(Some(UserClaims::for_user(&user, permissions, token.iat, token.exp)))
    }

    /// Verify user password; users without a usable password never match
    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        if let Some(ref hash) = user.password {
            let parsed_hash = PasswordHash::new(hash)
                .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
            return Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok());
        }

        Ok(false)
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Create a regular user.
    ///
    /// Username is mandatory, the email domain is normalized, staff and
    /// superuser flags default to false and the role to Member. Without a
    /// password the account gets an unusable one.
    pub async fn create_user(&self, mut user: CreateUser) -> AppResult<User> {
        user.username = user.username.trim().to_string();
        if user.username.is_empty() {
            return Err(AppError::Validation("The Username field must be set".to_string()));
        }

        user.email = user
            .email
            .as_deref()
            .map(User::normalize_email)
            .filter(|email| !email.is_empty());
        user.is_staff.get_or_insert(false);
        user.is_superuser.get_or_insert(false);
        user.validate()?;

        if self.repository.users.username_exists(&user.username, None).await? {
            return Err(AppError::Conflict("A user with that username already exists".to_string()));
        }
        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, None).await? {
                return Err(AppError::Conflict("A user with that email already exists".to_string()));
            }
        }

        let password = match user.password.as_deref() {
            Some(password) => Some(self.hash_password(password)?),
            None => None,
        };

        let created = self.repository.users.create(&user, password).await?;
        tracing::info!(user_id = created.id, username = %created.username, "User created");
        Ok(created)
    }

    /// Create a superuser: staff and superuser flags are forced on and
    /// explicitly disabling either is an error.
    pub async fn create_superuser(&self, mut user: CreateUser) -> AppResult<User> {
        let is_staff = *user.is_staff.get_or_insert(true);
        let is_superuser = *user.is_superuser.get_or_insert(true);

        if !is_staff {
            return Err(AppError::Validation("Superuser must have is_staff=True.".to_string()));
        }
        if !is_superuser {
            return Err(AppError::Validation("Superuser must have is_superuser=True.".to_string()));
        }

        self.create_user(user).await
    }

    /// Self-service registration: always a Member, never staff
    pub async fn register(&self, form: RegisterUser) -> AppResult<User> {
        form.validate()?;
        validate_password(&form.password1, &form.username, form.email.as_deref())?;

        self.create_user(CreateUser {
            username: form.username,
            email: form.email,
            password: Some(form.password1),
            role: Some(Role::Member),
            is_staff: Some(false),
            is_superuser: Some(false),
            ..CreateUser::default()
        })
        .await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users for the admin change list
    pub async fn search_users(&self, query: &UserQuery, page: Page) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query, page).await
    }

    /// Update an existing user (admin)
    pub async fn update_user(&self, id: i64, mut user: UpdateUser) -> AppResult<User> {
        user.validate()?;
        self.repository.users.get_by_id(id).await?;

        if let Some(ref username) = user.username {
            if self.repository.users.username_exists(username, Some(id)).await? {
                return Err(AppError::Conflict("A user with that username already exists".to_string()));
            }
        }

        user.email = user.email.as_deref().map(User::normalize_email);
        if let Some(ref email) = user.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("A user with that email already exists".to_string()));
            }
        }

        self.repository.users.update(id, &user).await
    }

    /// Set a user's password (admin)
    pub async fn set_password(&self, id: i64, password: &str) -> AppResult<()> {
        let user = self.repository.users.get_by_id(id).await?;
        validate_password(password, &user.username, user.email.as_deref())?;
        let hash = self.hash_password(password)?;
        self.repository.users.set_password(id, Some(hash)).await
    }

    /// Delete a user
    pub async fn delete_user(&self, id: i64) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// Update the caller's own profile; a password change needs the current one
    pub async fn update_profile(&self, user_id: i64, mut profile: UpdateProfile) -> AppResult<User> {
        profile.validate()?;
        let user = self.repository.users.get_by_id(user_id).await?;

        profile.email = profile
            .email
            .map(|email| email.as_deref().map(User::normalize_email));
        if let Some(Some(ref email)) = profile.email {
            if self.repository.users.email_exists(email, Some(user_id)).await? {
                return Err(AppError::Conflict("A user with that email already exists".to_string()));
            }
        }

        let password = match profile.new_password.as_deref() {
            Some(new_password) => {
                let current_password = profile.current_password.as_deref().ok_or_else(|| {
                    AppError::Validation("Current password required to change password".to_string())
                })?;

                if !self.verify_password(&user, current_password)? {
                    return Err(AppError::Authentication("Current password is incorrect".to_string()));
                }

                let email = match &profile.email {
                    Some(email) => email.as_deref(),
                    None => user.email.as_deref(),
                };
                validate_password(new_password, &user.username, email)?;
                Some(self.hash_password(new_password)?)
            }
            None => None,
        };

        self.repository.users.update_profile(user_id, &profile, password).await
    }

    /// Store or clear the profile photo path for a user
    pub async fn set_profile_photo(&self, user_id: i64, path: Option<&str>) -> AppResult<User> {
        self.repository.users.set_profile_photo(user_id, path).await
    }
}

/// Password rules applied to user-chosen passwords: minimum length, not
/// purely numeric, not a well-known password, not close to the username
/// or email.
pub fn validate_password(password: &str, username: &str, email: Option<&str>) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        )));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("This password is entirely numeric.".to_string()));
    }

    let lowered = password.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        return Err(AppError::Validation("This password is too common.".to_string()));
    }

    let email_local = email.and_then(|e| e.split('@').next());
    for attribute in std::iter::once(username).chain(email_local) {
        let attribute = attribute.to_lowercase();
        if attribute.len() >= 3 && (lowered.contains(&attribute) || attribute.contains(&lowered)) {
            return Err(AppError::Validation(
                "The password is too similar to the username or email.".to_string(),
            ));
        }
    }

    Ok(())
}
