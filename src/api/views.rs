//! Site pages: book list, library detail, login, registration, role areas
//! and the permission-gated book editing handlers.

use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    http::{header, StatusCode},
    response::Redirect,
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookWithAuthor, CreateBook, EditBook, CAN_ADD_BOOK, CAN_CHANGE_BOOK, CAN_DELETE_BOOK},
        library::LibraryDetail,
        user::{RegisterUser, Role},
    },
    AppState,
};

use super::SiteSession;

#[derive(Serialize)]
pub struct BookListPage {
    pub books: Vec<BookWithAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Fields expected by a site form
#[derive(Serialize)]
pub struct FormPage {
    pub action: String,
    pub fields: Vec<&'static str>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Greeting shown on a role area
#[derive(Serialize)]
pub struct AreaPage {
    pub area: String,
    pub message: String,
    pub username: String,
    pub role: Role,
}

/// Redirect targets must stay on this site
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Decode a posted form, urlencoded or JSON depending on its content type.
/// Handlers call this after their gate so anonymous posts still redirect.
async fn form_body<T: DeserializeOwned>(request: Request, state: &AppState) -> AppResult<T> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        let Json(body) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(body)
    } else {
        let Form(body) = Form::<T>::from_request(request, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(body)
    }
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((state.config.auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// All books with their authors
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<BookListPage>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(BookListPage { books }))
}

/// One library and the books it holds
pub async fn library_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<LibraryDetail>> {
    let library = state.services.catalog.get_library(id).await?;
    Ok(Json(library))
}

pub async fn login_page(Query(query): Query<NextQuery>) -> Json<FormPage> {
    Json(FormPage {
        action: "/login/".to_string(),
        fields: vec!["username", "password", "next"],
        next: safe_next(query.next.as_deref()).map(str::to_string),
    })
}

/// Check credentials, set the session cookie and go to `next` or the book list
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<(CookieJar, Redirect)> {
    let (token, _user) = state
        .services
        .users
        .authenticate(&form.username, &form.password)
        .await?;

    let target = safe_next(form.next.as_deref())
        .unwrap_or(state.config.auth.login_redirect_url.as_str())
        .to_string();

    Ok((jar.add(session_cookie(&state, token)), Redirect::to(&target)))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), "")).path("/");
    (
        jar.remove(cookie),
        Redirect::to(&state.config.auth.logout_redirect_url),
    )
}

pub async fn register_page() -> Json<FormPage> {
    Json(FormPage {
        action: "/register/".to_string(),
        fields: vec!["username", "email", "password1", "password2"],
        next: None,
    })
}

/// Create a Member account, log it in and go to the book list
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterUser>,
) -> AppResult<(CookieJar, Redirect)> {
    let user = state.services.users.register(form).await?;
    let token = state.services.users.create_token_for_user(&user).await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((
        jar.add(session_cookie(&state, token)),
        Redirect::to(&state.config.auth.login_redirect_url),
    ))
}

fn area(name: &str, session: &SiteSession, role: Role) -> AppResult<Json<AreaPage>> {
    let claims = session.require_role(role)?;
    Ok(Json(AreaPage {
        area: name.to_string(),
        message: format!("Welcome to the {} area, {}.", name, claims.sub),
        username: claims.sub.clone(),
        role: claims.role,
    }))
}

pub async fn admin_area(session: SiteSession) -> AppResult<Json<AreaPage>> {
    area("admin", &session, Role::Admin)
}

pub async fn librarian_area(session: SiteSession) -> AppResult<Json<AreaPage>> {
    area("librarian", &session, Role::Librarian)
}

pub async fn member_area(session: SiteSession) -> AppResult<Json<AreaPage>> {
    area("member", &session, Role::Member)
}

pub async fn add_book(
    State(state): State<AppState>,
    session: SiteSession,
    request: Request,
) -> AppResult<(StatusCode, Json<Book>)> {
    session.require_perm(CAN_ADD_BOOK)?;
    let book: CreateBook = form_body(request, &state).await?;
    let created = state.services.catalog.create_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn edit_book(
    State(state): State<AppState>,
    session: SiteSession,
    request: Request,
) -> AppResult<Json<Book>> {
    session.require_perm(CAN_CHANGE_BOOK)?;
    let (id, changes) = form_body::<EditBook>(request, &state).await?.into_update();
    let updated = state.services.catalog.update_book(id, changes).await?;
    Ok(Json(updated))
}

pub async fn delete_book(
    State(state): State<AppState>,
    session: SiteSession,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    session.require_perm(CAN_DELETE_BOOK)?;
    state.services.catalog.delete_book(id).await?;
    Ok(Redirect::to("/books/"))
}
