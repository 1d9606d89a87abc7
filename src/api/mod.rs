//! HTTP handlers: site pages, the JSON API and the admin endpoints

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod openapi;
pub mod views;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, OriginalUri},
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization, HeaderMapExt},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, UserClaims},
    AppState,
};

/// Paginated list wrapper used by the admin change lists
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Rows on this page
    pub items: Vec<T>,
    /// Total number of matching rows
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub per_page: i64,
}

/// Session token from the bearer header, falling back to the session cookie
fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    if let Some(Authorization(bearer)) = parts.headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
}

/// Characters left as-is in the `next` parameter of a login redirect
const NEXT_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Extractor for authenticated user from JWT token. Role, flags and
/// permissions come from the stored user, not from the token.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, &state.config.auth.cookie_name)
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token_claims = UserClaims::from_token(&token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let claims = state
            .services
            .users
            .session_claims(&token_claims)
            .await?
            .ok_or_else(|| AppError::Authentication("User is inactive or no longer exists".to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Optional session for site pages. Gates on it answer with a redirect to
/// the login page rather than an error body.
pub struct SiteSession {
    pub claims: Option<UserClaims>,
    /// Requested path and query, returned to after login
    path: String,
    login_url: String,
}

#[async_trait]
impl FromRequestParts<AppState> for SiteSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token_claims = session_token(parts, &state.config.auth.cookie_name)
            .and_then(|token| UserClaims::from_token(&token, &state.config.auth.jwt_secret).ok());

        let claims = match token_claims {
            Some(token_claims) => state.services.users.session_claims(&token_claims).await?,
            None => None,
        };

        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path())
            .to_string();

        Ok(SiteSession {
            claims,
            path,
            login_url: state.config.auth.login_url.clone(),
        })
    }
}

impl SiteSession {
    fn login_redirect(&self) -> AppError {
        AppError::LoginRequired {
            location: format!(
                "{}?next={}",
                self.login_url,
                utf8_percent_encode(&self.path, NEXT_ENCODE)
            ),
        }
    }

    /// Role gate: exact role match or back to the login page
    pub fn require_role(&self, role: Role) -> AppResult<&UserClaims> {
        match self.claims.as_ref() {
            Some(claims) if claims.has_role(role) => Ok(claims),
            _ => Err(self.login_redirect()),
        }
    }

    /// Permission gate: codename held or back to the login page
    pub fn require_perm(&self, codename: &str) -> AppResult<&UserClaims> {
        match self.claims.as_ref() {
            Some(claims) if claims.has_perm(codename) => Ok(claims),
            _ => Err(self.login_redirect()),
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Site pages
    let site = Router::new()
        .route("/books/", get(views::list_books))
        .route("/library/:id/", get(views::library_detail))
        .route("/login/", get(views::login_page).post(views::login))
        .route("/logout/", get(views::logout).post(views::logout))
        .route("/register/", get(views::register_page).post(views::register))
        .route("/admin-area/", get(views::admin_area))
        .route("/librarian-area/", get(views::librarian_area))
        .route("/member-area/", get(views::member_area))
        .route("/add_book/", post(views::add_book))
        .route("/edit_book/", post(views::edit_book))
        .route("/books/delete/:id/", post(views::delete_book));

    let upload_limit = state.config.media.max_upload_bytes + 64 * 1024;

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route(
            "/auth/profile/photo",
            put(auth::upload_profile_photo)
                .delete(auth::delete_profile_photo)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Catalog lookups
        .route("/catalog/authors/books", get(catalog::books_by_author))
        .route("/catalog/libraries/books", get(catalog::books_in_library))
        .route("/catalog/libraries/librarian", get(catalog::librarian_of_library))
        .nest("/admin", admin::router());

    let media = ServeDir::new(&state.config.media.root);
    let media_url = state.config.media.url.trim_end_matches('/').to_string();

    Router::new()
        .merge(site)
        .nest("/api/v1", api_v1)
        .with_state(state)
        .nest_service(&media_url, media)
        .merge(openapi::create_openapi_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
