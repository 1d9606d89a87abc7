//! Shared fixtures: a fresh database per test and request builders

use std::str::FromStr;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use library_catalog::{
    api, db,
    models::{
        author::CreateAuthor,
        book::{Book, CreateBook},
        user::{CreateUser, Role, User},
    },
    AppConfig, AppState,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "Tr0ub4dor-and-3";

pub struct TestApp {
    pub state: AppState,
    _media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        // One long-lived connection keeps the in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .expect("in-memory database");
        db::migrate(&pool).await.expect("migrations apply");

        let media = tempfile::tempdir().expect("media dir");
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.media.root = media.path().to_path_buf();
        config.media.max_upload_bytes = 1024;

        Self {
            state: AppState::new(config, pool),
            _media: media,
        }
    }

    pub fn router(&self) -> Router {
        api::create_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.expect("router answers")
    }

    pub async fn user(&self, username: &str, role: Role) -> User {
        self.state
            .services
            .users
            .create_user(CreateUser {
                username: username.to_string(),
                email: Some(format!("{}@Example.org", username)),
                password: Some(PASSWORD.to_string()),
                role: Some(role),
                ..CreateUser::default()
            })
            .await
            .expect("user created")
    }

    pub async fn staff(&self, username: &str, permissions: &[&str]) -> User {
        let user = self
            .state
            .services
            .users
            .create_user(CreateUser {
                username: username.to_string(),
                password: Some(PASSWORD.to_string()),
                is_staff: Some(true),
                ..CreateUser::default()
            })
            .await
            .expect("staff created");
        self.grant(&user, permissions).await;
        user
    }

    pub async fn superuser(&self, username: &str) -> User {
        self.state
            .services
            .users
            .create_superuser(CreateUser {
                username: username.to_string(),
                password: Some(PASSWORD.to_string()),
                role: Some(Role::Admin),
                ..CreateUser::default()
            })
            .await
            .expect("superuser created")
    }

    pub async fn grant(&self, user: &User, permissions: &[&str]) {
        let codenames: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
        self.state
            .services
            .permissions
            .set_user_permissions(user.id, &codenames)
            .await
            .expect("permissions granted");
    }

    pub async fn token(&self, user: &User) -> String {
        self.state
            .services
            .users
            .create_token_for_user(user)
            .await
            .expect("token issued")
    }

    pub async fn book(&self, title: &str, author: &str, year: Option<i32>) -> Book {
        let catalog = &self.state.services.catalog;
        let author = match catalog
            .search_authors(
                &library_catalog::models::author::AuthorQuery {
                    q: Some(author.to_string()),
                    ..Default::default()
                },
                library_catalog::repository::Page::new(None, None, 100),
            )
            .await
            .expect("author search")
            .0
            .into_iter()
            .find(|a| a.name == author)
        {
            Some(existing) => existing,
            None => catalog
                .create_author(CreateAuthor { name: author.to_string() })
                .await
                .expect("author created"),
        };

        catalog
            .create_book(CreateBook {
                title: title.to_string(),
                author_id: author.id,
                publication_year: year,
            })
            .await
            .expect("book created")
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("sessionid={}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn bearer(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Site request carrying the session cookie and a JSON body
pub fn cookie_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("sessionid={}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Session token from a `Set-Cookie: sessionid=...` header
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("sessionid="))
        .map(|rest| rest.split(';').next().unwrap_or("").to_string())
}
