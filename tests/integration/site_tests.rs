//! Site pages: role gates, login and registration forms, book editing

use axum::http::StatusCode;
use library_catalog::models::{
    book::{CAN_ADD_BOOK, CAN_DELETE_BOOK},
    library::CreateLibrary,
    user::{Role, UpdateUser},
};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn anonymous_visitor_is_sent_to_login() {
    let app = TestApp::new().await;

    let response = app.send(get("/admin-area/")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/admin-area/");
}

#[tokio::test]
async fn role_areas_admit_exact_role_only() {
    let app = TestApp::new().await;
    let member = app.user("mia", Role::Member).await;
    let admin = app.user("ada", Role::Admin).await;
    let member_token = app.token(&member).await;
    let admin_token = app.token(&admin).await;

    let response = app.send(get_with_cookie("/admin-area/", &member_token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/admin-area/");

    let response = app.send(get_with_cookie("/admin-area/", &admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["area"], "admin");
    assert_eq!(page["username"], "ada");

    // An Admin is not a Member
    let response = app.send(get_with_cookie("/member-area/", &admin_token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.send(get_with_cookie("/member-area/", &member_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_redirect_keeps_the_query_string() {
    let app = TestApp::new().await;

    let response = app.send(get("/member-area/?tab=loans&sort=due")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/login/?next=/member-area/%3Ftab%3Dloans%26sort%3Ddue"
    );

    // The login page hands the decoded target back
    let response = app.send(get(location(&response))).await;
    assert_eq!(body_json(response).await["next"], "/member-area/?tab=loans&sort=due");
}

#[tokio::test]
async fn deactivated_member_loses_access() {
    let app = TestApp::new().await;
    let member = app.user("mia", Role::Member).await;
    let token = app.token(&member).await;

    let response = app.send(get_with_cookie("/member-area/", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.state
        .services
        .users
        .update_user(
            member.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app.send(get_with_cookie("/member-area/", &token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/member-area/");
}

#[tokio::test]
async fn role_change_applies_to_existing_session() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    app.state
        .services
        .users
        .update_user(
            user.id,
            UpdateUser {
                role: Some(Role::Librarian),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app.send(get_with_cookie("/member-area/", &token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = app.send(get_with_cookie("/librarian-area/", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn superuser_flag_does_not_grant_a_role() {
    let app = TestApp::new().await;
    let root = app
        .state
        .services
        .users
        .create_superuser(library_catalog::models::user::CreateUser {
            username: "root".to_string(),
            password: Some(PASSWORD.to_string()),
            role: Some(Role::Member),
            ..Default::default()
        })
        .await
        .unwrap();
    let token = app.token(&root).await;

    let response = app.send(get_with_cookie("/librarian-area/", &token)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn register_logs_the_new_member_in() {
    let app = TestApp::new().await;

    let response = app
        .send(form(
            "/register/",
            "username=newbie&email=newbie%40example.org&password1=Quiet-river-42&password2=Quiet-river-42",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/books/");
    let token = session_cookie(&response).expect("session cookie set");

    let response = app.send(get_with_cookie("/member-area/", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_rejects_mismatched_passwords() {
    let app = TestApp::new().await;

    let response = app
        .send(form(
            "/register/",
            "username=newbie&password1=Quiet-river-42&password2=Quiet-river-43",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn register_rejects_weak_password() {
    let app = TestApp::new().await;

    let response = app
        .send(form("/register/", "username=newbie&password1=12345678&password2=12345678"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_taken_email() {
    let app = TestApp::new().await;
    app.user("alice", Role::Member).await;

    // Domain case is normalized before the uniqueness check
    let response = app
        .send(form(
            "/register/",
            "username=other&email=alice%40EXAMPLE.org&password1=Quiet-river-42&password2=Quiet-river-42",
        ))
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_form_redirects_to_next() {
    let app = TestApp::new().await;
    app.user("libby", Role::Librarian).await;

    let body = format!(
        "username=libby&password={}&next=%2Flibrarian-area%2F",
        urlencode(PASSWORD)
    );
    let response = app.send(form("/login/", &body)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/librarian-area/");
    let token = session_cookie(&response).expect("session cookie set");

    let response = app.send(get_with_cookie("/librarian-area/", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_form_ignores_offsite_next() {
    let app = TestApp::new().await;
    app.user("libby", Role::Librarian).await;

    let body = format!(
        "username=libby&password={}&next=%2F%2Fevil.example%2F",
        urlencode(PASSWORD)
    );
    let response = app.send(form("/login/", &body)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/books/");
}

#[tokio::test]
async fn login_form_rejects_wrong_password() {
    let app = TestApp::new().await;
    app.user("libby", Role::Librarian).await;

    let response = app
        .send(form("/login/", "username=libby&password=not-the-password"))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
}

#[tokio::test]
async fn login_page_echoes_safe_next() {
    let app = TestApp::new().await;

    let response = app.send(get("/login/?next=/member-area/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["action"], "/login/");
    assert_eq!(page["next"], "/member-area/");
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let app = TestApp::new().await;

    let user = app.user("mia", Role::Member).await;
    let token = app.token(&user).await;

    let response = app.send(get_with_cookie("/logout/", &token)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
    assert_eq!(session_cookie(&response).as_deref(), Some(""));
}

#[tokio::test]
async fn book_list_shows_authors() {
    let app = TestApp::new().await;
    app.book("Emma", "Jane Austen", Some(1815)).await;
    app.book("Dune", "Frank Herbert", Some(1965)).await;

    let response = app.send(get("/books/")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    let books = page["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["title"], "Dune");
    assert_eq!(books[0]["author_name"], "Frank Herbert");
}

#[tokio::test]
async fn library_detail_lists_held_books() {
    let app = TestApp::new().await;
    let emma = app.book("Emma", "Jane Austen", None).await;
    app.book("Dune", "Frank Herbert", None).await;
    let library = app
        .state
        .services
        .catalog
        .create_library(CreateLibrary {
            name: "Central".to_string(),
            book_ids: vec![emma.id],
        })
        .await
        .unwrap();

    let response = app.send(get(&format!("/library/{}/", library.id))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["name"], "Central");
    assert_eq!(page["books"].as_array().unwrap().len(), 1);
    assert_eq!(page["books"][0]["title"], "Emma");

    let response = app.send(get("/library/999/")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_book_requires_permission() {
    let app = TestApp::new().await;
    let member = app.user("mia", Role::Member).await;
    let author = app
        .state
        .services
        .catalog
        .create_author(library_catalog::models::author::CreateAuthor {
            name: "Ursula K. Le Guin".to_string(),
        })
        .await
        .unwrap();
    let body = json!({ "title": "The Dispossessed", "author_id": author.id });

    let token = app.token(&member).await;
    let response = app
        .send(cookie_json("POST", "/add_book/", &token, body.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/add_book/");

    app.grant(&member, &[CAN_ADD_BOOK]).await;
    let token = app.token(&member).await;
    let response = app.send(cookie_json("POST", "/add_book/", &token, body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let book = body_json(response).await;
    assert_eq!(book["title"], "The Dispossessed");
    assert_eq!(book["author_id"], author.id);
}

#[tokio::test]
async fn add_book_form_is_gated_before_it_is_read() {
    let app = TestApp::new().await;
    let author = app
        .state
        .services
        .catalog
        .create_author(library_catalog::models::author::CreateAuthor {
            name: "Ursula K. Le Guin".to_string(),
        })
        .await
        .unwrap();
    let body = format!("title=The+Lathe+of+Heaven&author_id={}&publication_year=1971", author.id);

    let response = app.send(form("/add_book/", &body)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=/add_book/");

    let librarian = app.user("libby", Role::Librarian).await;
    app.grant(&librarian, &[CAN_ADD_BOOK]).await;
    let token = app.token(&librarian).await;
    let mut request = form("/add_book/", &body);
    request.headers_mut().insert(
        axum::http::header::COOKIE,
        format!("sessionid={}", token).parse().unwrap(),
    );

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let book = body_json(response).await;
    assert_eq!(book["title"], "The Lathe of Heaven");
    assert_eq!(book["publication_year"], 1971);
}

#[tokio::test]
async fn add_book_with_unknown_author_is_rejected() {
    let app = TestApp::new().await;
    let librarian = app.user("libby", Role::Librarian).await;
    app.grant(&librarian, &[CAN_ADD_BOOK]).await;
    let token = app.token(&librarian).await;

    let response = app
        .send(cookie_json(
            "POST",
            "/add_book/",
            &token,
            json!({ "title": "Orphan", "author_id": 4242 }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn edit_book_updates_title() {
    let app = TestApp::new().await;
    let book = app.book("Emma", "Jane Austen", None).await;
    let librarian = app.user("libby", Role::Librarian).await;
    app.grant(&librarian, &["can_change_book"]).await;
    let token = app.token(&librarian).await;

    let response = app
        .send(cookie_json(
            "POST",
            "/edit_book/",
            &token,
            json!({ "id": book.id, "title": "Emma (annotated)" }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["title"], "Emma (annotated)");
    assert_eq!(updated["author_id"], book.author_id);
}

#[tokio::test]
async fn delete_book_redirects_to_list() {
    let app = TestApp::new().await;
    let book = app.book("Emma", "Jane Austen", None).await;
    let librarian = app.user("libby", Role::Librarian).await;
    app.grant(&librarian, &[CAN_DELETE_BOOK]).await;
    let token = app.token(&librarian).await;

    let uri = format!("/books/delete/{}/", book.id);
    let response = app
        .send(cookie_json("POST", &uri, &token, json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/books/");
    assert!(app.state.services.catalog.list_books().await.unwrap().is_empty());
}

#[tokio::test]
async fn revoked_permission_applies_to_existing_session() {
    let app = TestApp::new().await;
    let book = app.book("Emma", "Jane Austen", None).await;
    let librarian = app.user("libby", Role::Librarian).await;
    app.grant(&librarian, &[CAN_DELETE_BOOK]).await;
    let token = app.token(&librarian).await;

    app.grant(&librarian, &[]).await;

    let uri = format!("/books/delete/{}/", book.id);
    let response = app
        .send(cookie_json("POST", &uri, &token, json!({})))
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/login/?next={}", uri));
    assert_eq!(app.state.services.catalog.list_books().await.unwrap().len(), 1);
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}
