//! Service rules exercised against a real schema

use library_catalog::{
    error::AppError,
    models::{
        author::CreateAuthor,
        book::UpdateBook,
        librarian::{CreateLibrarian, UpdateLibrarian},
        library::CreateLibrary,
        permission::CreateGroup,
        user::{CreateUser, Role, UpdateUser},
    },
};

use crate::helpers::*;

#[tokio::test]
async fn create_user_requires_username() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .users
        .create_user(CreateUser {
            username: "   ".to_string(),
            ..Default::default()
        })
        .await;

    match result {
        Err(AppError::Validation(message)) => assert_eq!(message, "The Username field must be set"),
        other => panic!("expected validation error, got {:?}", other.map(|u| u.id)),
    }
}

#[tokio::test]
async fn create_user_defaults() {
    let app = TestApp::new().await;

    let user = app
        .state
        .services
        .users
        .create_user(CreateUser {
            username: "plain".to_string(),
            email: Some("Plain.User@EXAMPLE.Com".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(user.email.as_deref(), Some("Plain.User@example.com"));
    assert_eq!(user.role, Role::Member);
    assert!(!user.is_staff);
    assert!(!user.is_superuser);
    assert!(user.is_active);
    // No password given: the account cannot log in
    assert!(!user.has_usable_password());
    assert!(app
        .state
        .services
        .users
        .authenticate("plain", "")
        .await
        .is_err());
}

#[tokio::test]
async fn usernames_are_unique_ignoring_case() {
    let app = TestApp::new().await;
    app.user("Alice", Role::Member).await;

    let result = app
        .state
        .services
        .users
        .create_user(CreateUser {
            username: "alice".to_string(),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn create_superuser_forces_flags() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;

    let root = app.superuser("root").await;
    assert!(root.is_staff);
    assert!(root.is_superuser);

    let result = users
        .create_superuser(CreateUser {
            username: "halfroot".to_string(),
            is_staff: Some(false),
            ..Default::default()
        })
        .await;
    match result {
        Err(AppError::Validation(message)) => {
            assert_eq!(message, "Superuser must have is_staff=True.")
        }
        _ => panic!("expected is_staff validation error"),
    }

    let result = users
        .create_superuser(CreateUser {
            username: "notroot".to_string(),
            is_superuser: Some(false),
            ..Default::default()
        })
        .await;
    match result {
        Err(AppError::Validation(message)) => {
            assert_eq!(message, "Superuser must have is_superuser=True.")
        }
        _ => panic!("expected is_superuser validation error"),
    }
}

#[tokio::test]
async fn effective_permissions_union_direct_and_group() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let user = app.user("libby", Role::Librarian).await;

    let group = services
        .permissions
        .create_group(CreateGroup {
            name: "Shelvers".to_string(),
            permissions: vec!["can_add_book".to_string(), "can_change_book".to_string()],
        })
        .await
        .unwrap();
    services
        .permissions
        .set_user_groups(user.id, &[group.id])
        .await
        .unwrap();
    app.grant(&user, &["can_change_book", "can_delete_book"]).await;

    let permissions = services.users.effective_permissions(&user).await.unwrap();

    assert_eq!(
        permissions,
        vec!["can_add_book", "can_change_book", "can_delete_book"]
    );
}

#[tokio::test]
async fn superuser_holds_all_and_inactive_holds_none() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;

    let root = app.superuser("root").await;
    let all = app.state.services.permissions.list_permissions().await.unwrap();
    assert_eq!(users.effective_permissions(&root).await.unwrap().len(), all.len());

    let user = app.user("gone", Role::Librarian).await;
    app.grant(&user, &["can_add_book"]).await;
    let user = users
        .update_user(
            user.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(users.effective_permissions(&user).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_permission_codename_is_rejected() {
    let app = TestApp::new().await;
    let user = app.user("mia", Role::Member).await;

    let result = app
        .state
        .services
        .permissions
        .set_user_permissions(user.id, &["can_fly".to_string()])
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn update_book_to_unknown_author_is_rejected() {
    let app = TestApp::new().await;
    let book = app.book("Emma", "Jane Austen", None).await;

    let result = app
        .state
        .services
        .catalog
        .update_book(
            book.id,
            UpdateBook {
                author_id: Some(777),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn deleting_an_author_deletes_their_books_and_holdings() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.catalog;
    let emma = app.book("Emma", "Jane Austen", None).await;
    let dune = app.book("Dune", "Frank Herbert", None).await;
    let library = catalog
        .create_library(CreateLibrary {
            name: "Central".to_string(),
            book_ids: vec![emma.id, dune.id],
        })
        .await
        .unwrap();

    catalog.delete_author(emma.author_id).await.unwrap();

    let remaining = catalog.list_books().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Dune");
    let detail = catalog.get_library(library.id).await.unwrap();
    assert_eq!(detail.books.len(), 1);
}

#[tokio::test]
async fn deleting_a_library_removes_its_librarian() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.catalog;
    let library = catalog
        .create_library(CreateLibrary {
            name: "Central".to_string(),
            book_ids: vec![],
        })
        .await
        .unwrap();
    let librarian = catalog
        .create_librarian(CreateLibrarian {
            name: "Libby".to_string(),
            library_id: library.id,
            user_id: None,
        })
        .await
        .unwrap();

    catalog.delete_library(library.id).await.unwrap();

    assert!(matches!(
        catalog.get_librarian(librarian.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_a_user_removes_their_librarian_record() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.catalog;
    let user = app.user("libby", Role::Librarian).await;
    let library = catalog
        .create_library(CreateLibrary {
            name: "Central".to_string(),
            book_ids: vec![],
        })
        .await
        .unwrap();
    let librarian = catalog
        .create_librarian(CreateLibrarian {
            name: "Libby".to_string(),
            library_id: library.id,
            user_id: Some(user.id),
        })
        .await
        .unwrap();

    app.state.services.users.delete_user(user.id).await.unwrap();

    assert!(catalog.get_librarian(librarian.id).await.is_err());
}

#[tokio::test]
async fn a_user_can_staff_only_one_library() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.catalog;
    let user = app.user("libby", Role::Librarian).await;
    let mut library_ids = Vec::new();
    for name in ["Central", "Annex"] {
        let library = catalog
            .create_library(CreateLibrary {
                name: name.to_string(),
                book_ids: vec![],
            })
            .await
            .unwrap();
        library_ids.push(library.id);
    }

    let first = catalog
        .create_librarian(CreateLibrarian {
            name: "Libby".to_string(),
            library_id: library_ids[0],
            user_id: Some(user.id),
        })
        .await
        .unwrap();
    let second = catalog
        .create_librarian(CreateLibrarian {
            name: "Libby again".to_string(),
            library_id: library_ids[1],
            user_id: Some(user.id),
        })
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    // Moving the existing record to a free library is fine
    let moved = catalog
        .update_librarian(
            first.id,
            UpdateLibrarian {
                library_id: Some(library_ids[1]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.library_id, library_ids[1]);
}

#[tokio::test]
async fn author_names_need_not_be_unique() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.catalog;
    for _ in 0..2 {
        catalog
            .create_author(CreateAuthor { name: "Anonymous".to_string() })
            .await
            .unwrap();
    }

    assert!(matches!(
        catalog.books_by_author_name("Anonymous").await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        catalog.books_by_author_name("Nobody").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn session_claims_follow_the_stored_user() {
    let app = TestApp::new().await;
    let users = &app.state.services.users;
    let user = app.user("libby", Role::Member).await;
    app.grant(&user, &["can_add_book"]).await;
    let token = app.token(&user).await;
    let issued = library_catalog::models::user::UserClaims::from_token(&token, "integration-test-secret")
        .unwrap();

    users
        .update_user(
            user.id,
            UpdateUser {
                role: Some(Role::Librarian),
                is_staff: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    app.grant(&user, &["can_change_book"]).await;

    let current = users.session_claims(&issued).await.unwrap().unwrap();
    assert_eq!(current.role, Role::Librarian);
    assert!(current.is_staff);
    assert_eq!(current.permissions, vec!["can_change_book"]);
    assert_eq!(current.exp, issued.exp);

    users.delete_user(user.id).await.unwrap();
    assert!(users.session_claims(&issued).await.unwrap().is_none());
}
