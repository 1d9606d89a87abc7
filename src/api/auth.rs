//! Authentication and own-profile endpoints

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, UpdateProfile, User},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Current user as seen by themselves
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<i32>,
    pub profile_photo_url: Option<String>,
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Effective permission codenames
    pub permissions: Vec<String>,
}

impl UserInfo {
    fn new(user: User, permissions: Vec<String>, state: &AppState) -> Self {
        UserInfo {
            age: user.age(),
            profile_photo_url: user
                .profile_photo
                .as_deref()
                .map(|path| state.services.media.url_for(path)),
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            date_of_birth: user.date_of_birth,
            role: user.role,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            permissions,
        }
    }

    async fn load(state: &AppState, user: User) -> AppResult<Self> {
        let permissions = state.services.users.effective_permissions(&user).await?;
        Ok(Self::new(user, permissions, state))
    }
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state
        .services
        .users
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.session_ttl_seconds(),
        user: UserInfo::load(&state, user).await?,
    }))
}

/// Get current user information
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user info", body = UserInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.users.get_by_id(claims.user_id).await?;
    Ok(Json(UserInfo::load(&state, user).await?))
}

/// Update current user's profile
#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserInfo),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated or wrong current password"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(profile): Json<UpdateProfile>,
) -> AppResult<Json<UserInfo>> {
    let user = state
        .services
        .users
        .update_profile(claims.user_id, profile)
        .await?;
    Ok(Json(UserInfo::load(&state, user).await?))
}

/// Upload or replace the profile photo (multipart field `photo`)
#[utoipa::path(
    put,
    path = "/auth/profile/photo",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Image in the `photo` field"
    ),
    responses(
        (status = 200, description = "Photo stored", body = UserInfo),
        (status = 400, description = "Missing field, unsupported type or too large")
    )
)]
pub async fn upload_profile_photo(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<Json<UserInfo>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let media = &state.services.media;
        let stored = media
            .save_profile_photo(claims.user_id, content_type.as_deref(), &data)
            .await?;

        let previous = state.services.users.get_by_id(claims.user_id).await?.profile_photo;
        let user = state
            .services
            .users
            .set_profile_photo(claims.user_id, Some(&stored))
            .await?;
        if let Some(previous) = previous {
            media.remove(&previous).await?;
        }

        return Ok(Json(UserInfo::load(&state, user).await?));
    }

    Err(AppError::Validation("Missing `photo` field".to_string()))
}

/// Remove the profile photo
#[utoipa::path(
    delete,
    path = "/auth/profile/photo",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Photo removed", body = UserInfo)
    )
)]
pub async fn delete_profile_photo(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let previous = state.services.users.get_by_id(claims.user_id).await?.profile_photo;
    let user = state
        .services
        .users
        .set_profile_photo(claims.user_id, None)
        .await?;

    if let Some(previous) = previous {
        state.services.media.remove(&previous).await?;
    }

    Ok(Json(UserInfo::load(&state, user).await?))
}
