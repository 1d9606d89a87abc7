//! JSON API: health, token login, own profile and catalog lookups

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use library_catalog::models::{
    author::CreateAuthor,
    librarian::CreateLibrarian,
    library::CreateLibrary,
    user::{Role, UpdateUser},
};
use serde_json::json;

use crate::helpers::*;

const BOUNDARY: &str = "catalog-test-boundary";

fn photo_upload(token: &str, field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"me.png\"\r\nContent-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            f = field,
            ct = content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("PUT")
        .uri("/api/v1/auth/profile/photo")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_and_readiness() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/v1/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app.send(get("/api/v1/ready")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ready");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app.send(get("/api-docs/openapi.json")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/auth/login"].is_object());
    assert_eq!(doc["servers"][0]["url"], "/api/v1");
    let upload = &doc["paths"]["/auth/profile/photo"]["put"]["requestBody"]["content"];
    assert!(upload["multipart/form-data"].is_object());
}

#[tokio::test]
async fn login_returns_token_and_permissions() {
    let app = TestApp::new().await;
    let user = app.user("libby", Role::Librarian).await;
    app.grant(&user, &["can_add_book"]).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "libby", "password": PASSWORD }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 24 * 3600);
    assert_eq!(body["user"]["role"], "Librarian");
    assert_eq!(body["user"]["permissions"], json!(["can_add_book"]));

    let token = body["token"].as_str().unwrap();
    let response = app.send(bearer("GET", "/api/v1/auth/me", token, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "libby");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.user("libby", Role::Librarian).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "libby", "password": "wrong-password" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "nobody", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inactive_user_cannot_log_in() {
    let app = TestApp::new().await;
    let user = app.user("gone", Role::Member).await;
    app.state
        .services
        .users
        .update_user(
            user.id,
            library_catalog::models::user::UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "gone", "password": PASSWORD }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let app = TestApp::new().await;

    let response = app.send(get("/api/v1/auth/me")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(bearer("GET", "/api/v1/auth/me", "not-a-jwt", None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_accepts_the_session_cookie() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app.send(get_with_cookie("/api/v1/auth/me", &token)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["email"], "mia@example.org");
}

#[tokio::test]
async fn profile_update_sets_birth_date_and_age() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app
        .send(bearer(
            "PUT",
            "/api/v1/auth/profile",
            &token,
            Some(json!({ "first_name": "Mia", "date_of_birth": "1990-01-01" })),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["first_name"], "Mia");
    assert_eq!(body["date_of_birth"], "1990-01-01");
    assert!(body["age"].as_i64().unwrap() >= 35);
}

#[tokio::test]
async fn profile_update_clears_fields_set_to_null() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app
        .send(bearer(
            "PUT",
            "/api/v1/auth/profile",
            &token,
            Some(json!({ "date_of_birth": "1990-01-01" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Absent fields stay, explicit nulls clear
    let response = app
        .send(bearer(
            "PUT",
            "/api/v1/auth/profile",
            &token,
            Some(json!({ "first_name": "Mia", "date_of_birth": null, "email": null })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["first_name"], "Mia");
    assert!(body["date_of_birth"].is_null());
    assert!(body["age"].is_null());
    assert!(body["email"].is_null());

    let response = app
        .send(bearer(
            "PUT",
            "/api/v1/auth/profile",
            &token,
            Some(json!({ "last_name": "Lane" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["first_name"], "Mia");
    assert!(body["email"].is_null());
}

#[tokio::test]
async fn tokens_of_deactivated_or_deleted_users_are_refused() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;
    let mia = app.user("mia", Role::Member).await;
    let leo = app.user("leo", Role::Member).await;
    let mia_token = app.token(&mia).await;
    let leo_token = app.token(&leo).await;

    users
        .update_user(
            mia.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    users.delete_user(leo.id).await.unwrap();

    let response = app
        .send(bearer("GET", "/api/v1/auth/me", &mia_token, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(bearer("GET", "/api/v1/auth/me", &leo_token, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_needs_current_password() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app
        .send(bearer(
            "PUT",
            "/api/v1/auth/profile",
            &token,
            Some(json!({ "new_password": "Another-long-pass-9" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(bearer(
            "PUT",
            "/api/v1/auth/profile",
            &token,
            Some(json!({
                "current_password": "wrong-password",
                "new_password": "Another-long-pass-9"
            })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .send(bearer(
            "PUT",
            "/api/v1/auth/profile",
            &token,
            Some(json!({
                "current_password": PASSWORD,
                "new_password": "Another-long-pass-9"
            })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "username": "mia", "password": "Another-long-pass-9" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_photo_upload_and_removal() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;
    let png = b"\x89PNG\r\n\x1a\nnot-really-an-image";

    let response = app.send(photo_upload(&token, "photo", "image/png", png)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body["profile_photo_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/media/profile_photos/user_"));
    assert!(url.ends_with(".png"));

    let response = app.send(get(&url)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(bearer("DELETE", "/api/v1/auth/profile/photo", &token, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["profile_photo_url"].is_null());

    let response = app.send(get(&url)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_photo_rejects_non_images_and_oversized_files() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app
        .send(photo_upload(&token, "photo", "text/plain", b"hello"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(photo_upload(&token, "photo", "image/png", &[0u8; 2048]))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(photo_upload(&token, "avatar", "image/png", b"png"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn books_by_author_name() {
    let app = TestApp::new().await;
    app.book("Persuasion", "Jane Austen", None).await;
    app.book("Emma", "Jane Austen", None).await;
    app.book("Dune", "Frank Herbert", None).await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app
        .send(bearer(
            "GET",
            "/api/v1/catalog/authors/books?name=Jane%20Austen",
            &token,
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let books = body_json(response).await;
    let titles: Vec<&str> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Emma", "Persuasion"]);

    let response = app
        .send(bearer(
            "GET",
            "/api/v1/catalog/authors/books?name=Nobody",
            &token,
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ambiguous_author_name_is_a_conflict() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.catalog;
    for _ in 0..2 {
        catalog
            .create_author(CreateAuthor { name: "Anonymous".to_string() })
            .await
            .unwrap();
    }
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app
        .send(bearer(
            "GET",
            "/api/v1/catalog/authors/books?name=Anonymous",
            &token,
            None,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn library_lookups_by_name() {
    let app = TestApp::new().await;
    let emma = app.book("Emma", "Jane Austen", None).await;
    let catalog = &app.state.services.catalog;
    let library = catalog
        .create_library(CreateLibrary {
            name: "Central".to_string(),
            book_ids: vec![emma.id],
        })
        .await
        .unwrap();
    catalog
        .create_library(CreateLibrary {
            name: "Annex".to_string(),
            book_ids: vec![],
        })
        .await
        .unwrap();
    let libby = app.user("libby", Role::Librarian).await;
    catalog
        .create_librarian(CreateLibrarian {
            name: "Libby Reed".to_string(),
            library_id: library.id,
            user_id: Some(libby.id),
        })
        .await
        .unwrap();
    let token = app.token(&libby).await;

    let response = app
        .send(bearer("GET", "/api/v1/catalog/libraries/books?name=Central", &token, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["books"][0]["title"], "Emma");

    let response = app
        .send(bearer("GET", "/api/v1/catalog/libraries/librarian?name=Central", &token, None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let librarian = body_json(response).await;
    assert_eq!(librarian["name"], "Libby Reed");
    assert_eq!(librarian["library_name"], "Central");
    assert_eq!(librarian["username"], "libby");

    let response = app
        .send(bearer("GET", "/api/v1/catalog/libraries/librarian?name=Annex", &token, None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_lookups_require_authentication() {
    let app = TestApp::new().await;

    let response = app
        .send(get("/api/v1/catalog/libraries/books?name=Central"))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
