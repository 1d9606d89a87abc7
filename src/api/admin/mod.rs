//! Admin endpoints: one change list and CRUD set per registered model

pub mod authors;
pub mod books;
pub mod groups;
pub mod librarians;
pub mod libraries;
pub mod users;

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Page, AppState};

use super::{AuthenticatedUser, PaginatedResponse};

/// Change-list and form layout of one model
#[derive(Debug, Serialize, ToSchema)]
pub struct ModelAdmin {
    /// Model name used in permission codenames
    #[schema(value_type = String)]
    pub model: &'static str,
    #[schema(value_type = String)]
    pub verbose_name: &'static str,
    /// Path under the admin root
    #[schema(value_type = String)]
    pub url: &'static str,
    #[schema(value_type = Vec<String>)]
    pub list_display: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub list_filter: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub search_fields: &'static [&'static str],
    #[schema(value_type = Vec<String>)]
    pub ordering: &'static [&'static str],
    pub list_per_page: i64,
    #[schema(value_type = Vec<Fieldset>)]
    pub fieldsets: &'static [Fieldset],
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Fieldset {
    #[schema(value_type = Option<String>)]
    pub name: Option<&'static str>,
    #[schema(value_type = Vec<String>)]
    pub fields: &'static [&'static str],
}

pub const USER_ADMIN: ModelAdmin = ModelAdmin {
    model: "customuser",
    verbose_name: "user",
    url: "/users",
    list_display: &[
        "username", "email", "first_name", "last_name", "role", "age",
        "profile_photo", "is_staff", "is_active", "date_joined",
    ],
    list_filter: &[
        "role", "is_staff", "is_superuser", "is_active", "date_joined", "date_of_birth",
    ],
    search_fields: &["username", "first_name", "last_name", "email"],
    ordering: &["username"],
    list_per_page: 100,
    fieldsets: &[
        Fieldset { name: None, fields: &["username", "password"] },
        Fieldset {
            name: Some("Personal info"),
            fields: &["first_name", "last_name", "email", "date_of_birth", "profile_photo"],
        },
        Fieldset {
            name: Some("Role & Permissions"),
            fields: &["role", "is_active", "is_staff", "is_superuser", "groups", "user_permissions"],
        },
        Fieldset { name: Some("Important dates"), fields: &["last_login", "date_joined"] },
    ],
};

pub const AUTHOR_ADMIN: ModelAdmin = ModelAdmin {
    model: "author",
    verbose_name: "author",
    url: "/authors",
    list_display: &["name"],
    list_filter: &[],
    search_fields: &["name"],
    ordering: &["name"],
    list_per_page: 100,
    fieldsets: &[Fieldset { name: None, fields: &["name"] }],
};

pub const BOOK_ADMIN: ModelAdmin = ModelAdmin {
    model: "book",
    verbose_name: "book",
    url: "/books",
    list_display: &["title", "author", "publication_year"],
    list_filter: &["author", "publication_year"],
    search_fields: &["title", "author__name"],
    ordering: &["title"],
    list_per_page: 25,
    fieldsets: &[Fieldset { name: None, fields: &["title", "author", "publication_year"] }],
};

pub const LIBRARY_ADMIN: ModelAdmin = ModelAdmin {
    model: "library",
    verbose_name: "library",
    url: "/libraries",
    list_display: &["name", "book_count"],
    list_filter: &[],
    search_fields: &["name"],
    ordering: &["name"],
    list_per_page: 100,
    fieldsets: &[Fieldset { name: None, fields: &["name", "books"] }],
};

pub const LIBRARIAN_ADMIN: ModelAdmin = ModelAdmin {
    model: "librarian",
    verbose_name: "librarian",
    url: "/librarians",
    list_display: &["name", "library", "user"],
    list_filter: &["library"],
    search_fields: &["name", "library__name", "user__username"],
    ordering: &["name"],
    list_per_page: 100,
    fieldsets: &[Fieldset { name: None, fields: &["name", "library", "user"] }],
};

pub const REGISTRY: [&ModelAdmin; 5] = [
    &USER_ADMIN,
    &AUTHOR_ADMIN,
    &BOOK_ADMIN,
    &LIBRARY_ADMIN,
    &LIBRARIAN_ADMIN,
];

#[derive(Serialize, ToSchema)]
pub struct AdminIndex {
    pub site_header: String,
    pub site_title: String,
    pub index_title: String,
    /// Models the caller may at least view
    #[schema(value_type = Vec<ModelAdmin>)]
    pub models: Vec<&'static ModelAdmin>,
}

/// Admin site index
#[utoipa::path(
    get,
    path = "/admin",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Site titles and registered models", body = AdminIndex),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn index(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AdminIndex>> {
    claims.require_staff()?;

    let admin = &state.config.admin;
    Ok(Json(AdminIndex {
        site_header: admin.site_header.clone(),
        site_title: admin.site_title.clone(),
        index_title: admin.index_title.clone(),
        models: REGISTRY
            .into_iter()
            .filter(|m| claims.has_perm(&format!("view_{}", m.model)))
            .collect(),
    }))
}

/// Page window for a model's change list
fn page_for(admin: &ModelAdmin, page: Option<i64>, per_page: Option<i64>) -> Page {
    Page::new(page, per_page, admin.list_per_page)
}

fn paginated<T>(items: Vec<T>, total: i64, page: Page) -> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    PaginatedResponse {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/:id/password", put(users::set_password))
        .route(
            "/users/:id/permissions",
            get(users::get_permissions).put(users::set_permissions),
        )
        .route("/users/:id/groups", get(users::get_groups).put(users::set_groups))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Libraries
        .route("/libraries", get(libraries::list_libraries).post(libraries::create_library))
        .route(
            "/libraries/:id",
            get(libraries::get_library)
                .put(libraries::update_library)
                .delete(libraries::delete_library),
        )
        // Librarians
        .route(
            "/librarians",
            get(librarians::list_librarians).post(librarians::create_librarian),
        )
        .route(
            "/librarians/:id",
            get(librarians::get_librarian)
                .put(librarians::update_librarian)
                .delete(librarians::delete_librarian),
        )
        // Groups and permissions
        .route("/permissions", get(groups::list_permissions))
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/:id", get(groups::get_group).delete(groups::delete_group))
        .route("/groups/:id/permissions", put(groups::set_group_permissions))
}
