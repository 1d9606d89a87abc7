//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, catalog, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "1.0.0",
        description = "Library catalog, accounts and administration REST API",
        license(name = "MIT")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::update_profile,
        auth::upload_profile_photo,
        auth::delete_profile_photo,
        // Catalog lookups
        catalog::books_by_author,
        catalog::books_in_library,
        catalog::librarian_of_library,
        // Admin
        admin::index,
        admin::users::list_users,
        admin::users::get_user,
        admin::users::create_user,
        admin::users::update_user,
        admin::users::delete_user,
        admin::users::set_password,
        admin::users::get_permissions,
        admin::users::set_permissions,
        admin::users::get_groups,
        admin::users::set_groups,
        admin::authors::list_authors,
        admin::authors::get_author,
        admin::authors::create_author,
        admin::authors::update_author,
        admin::authors::delete_author,
        admin::books::list_books,
        admin::books::get_book,
        admin::books::create_book,
        admin::books::update_book,
        admin::books::delete_book,
        admin::libraries::list_libraries,
        admin::libraries::get_library,
        admin::libraries::create_library,
        admin::libraries::update_library,
        admin::libraries::delete_library,
        admin::librarians::list_librarians,
        admin::librarians::get_librarian,
        admin::librarians::create_librarian,
        admin::librarians::update_librarian,
        admin::librarians::delete_librarian,
        admin::groups::list_permissions,
        admin::groups::list_groups,
        admin::groups::get_group,
        admin::groups::create_group,
        admin::groups::set_group_permissions,
        admin::groups::delete_group,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateProfile,
            crate::models::user::SetPassword,
            // Catalog
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::book::Book,
            crate::models::book::BookWithAuthor,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::library::Library,
            crate::models::library::LibrarySummary,
            crate::models::library::LibraryDetail,
            crate::models::library::CreateLibrary,
            crate::models::library::UpdateLibrary,
            crate::models::librarian::Librarian,
            crate::models::librarian::LibrarianDetails,
            crate::models::librarian::CreateLibrarian,
            crate::models::librarian::UpdateLibrarian,
            // Permissions
            crate::models::permission::Permission,
            crate::models::permission::Group,
            crate::models::permission::CreateGroup,
            crate::models::permission::SetPermissions,
            crate::models::permission::SetGroups,
            // Admin
            admin::AdminIndex,
            admin::ModelAdmin,
            admin::Fieldset,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and own profile"),
        (name = "catalog", description = "Catalog lookups by name"),
        (name = "admin", description = "Administration of every model")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
