//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, book_instances, books, genres, health, home, languages, users};

/// Registers the JWT bearer scheme referenced by protected endpoints
struct BearerAuth;

impl Modify for BearerAuth {
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

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "Library catalog and loans REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        home::index,
        // Auth
        auth::login,
        auth::me,
        // Catalog
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        authors::list_authors,
        authors::get_author,
        authors::author_form,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        genres::list_genres,
        genres::get_genre,
        genres::create_genre,
        genres::update_genre,
        genres::delete_genre,
        languages::list_languages,
        languages::get_language,
        languages::create_language,
        languages::update_language,
        languages::delete_language,
        // Loans
        book_instances::list_book_instances,
        book_instances::get_book_instance,
        book_instances::create_book_instance,
        book_instances::update_book_instance,
        book_instances::delete_book_instance,
        book_instances::my_borrowed,
        book_instances::all_borrowed,
        book_instances::renewal_form,
        book_instances::renew_book_instance,
        // Users
        users::list_users,
        users::create_user,
        users::update_permissions,
        users::delete_user,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Catalog
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookSummary,
            crate::models::book::BookDetail,
            crate::models::book::BookInput,
            crate::models::author::Author,
            crate::models::author::AuthorDetail,
            crate::models::author::AuthorInput,
            crate::models::author::AuthorFormInitial,
            crate::models::genre::Genre,
            crate::models::genre::GenreInput,
            crate::models::language::Language,
            crate::models::language::LanguageInput,
            crate::api::BookPage,
            crate::api::AuthorPage,
            crate::api::GenrePage,
            crate::api::LanguagePage,
            // Loans
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstanceDetails,
            crate::models::book_instance::BookInstanceInput,
            crate::models::book_instance::RenewalRequest,
            crate::models::book_instance::RenewalForm,
            crate::api::BookInstancePage,
            // Users
            crate::models::user::Permission,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            crate::models::user::UpdatePermissions,
            // Health
            health::HealthResponse,
            home::HomeResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Books, authors, genres and languages"),
        (name = "loans", description = "Copies, loans and renewals"),
        (name = "users", description = "User and permission management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
