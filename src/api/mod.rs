//! API handlers for the catalog REST endpoints

pub mod auth;
pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod health;
pub mod home;
pub mod languages;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{
        author::Author,
        book::BookSummary,
        book_instance::BookInstanceDetails,
        genre::Genre,
        language::Language,
        page::Pagination,
        user::UserClaims,
    },
    AppState,
};

/// Extractor for authenticated user from JWT token. Rights come from the
/// user's current row, not from the token.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let user = state
            .services
            .users
            .get_by_id(claims.user_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::Authentication("User no longer exists".to_string())
                }
                other => other,
            })?;

        Ok(AuthenticatedUser(claims.with_current_rights(&user)?))
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    BookPage = PaginatedResponse<BookSummary>,
    AuthorPage = PaginatedResponse<Author>,
    GenrePage = PaginatedResponse<Genre>,
    LanguagePage = PaginatedResponse<Language>,
    BookInstancePage = PaginatedResponse<BookInstanceDetails>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Entries on this page
    pub items: Vec<T>,
    /// Total number of entries
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Entries per page
    pub per_page: i64,
    /// Number of pages
    pub num_pages: i64,
    /// Whether more than one page exists
    pub is_paginated: bool,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
        Self {
            items,
            total: pagination.total,
            page: pagination.page,
            per_page: pagination.per_page,
            num_pages: pagination.num_pages,
            is_paginated: pagination.is_paginated(),
        }
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Home page summary
        .route("/home", get(home::index))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route("/author-form", get(authors::author_form))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Genres
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/genres/:id",
            get(genres::get_genre).put(genres::update_genre).delete(genres::delete_genre),
        )
        // Languages
        .route("/languages", get(languages::list_languages).post(languages::create_language))
        .route(
            "/languages/:id",
            get(languages::get_language)
                .put(languages::update_language)
                .delete(languages::delete_language),
        )
        // Copies and loans
        .route(
            "/bookinstances",
            get(book_instances::list_book_instances).post(book_instances::create_book_instance),
        )
        .route(
            "/bookinstances/:id",
            get(book_instances::get_book_instance)
                .put(book_instances::update_book_instance)
                .delete(book_instances::delete_book_instance),
        )
        .route(
            "/bookinstances/:id/renew",
            get(book_instances::renewal_form).post(book_instances::renew_book_instance),
        )
        .route("/mybooks", get(book_instances::my_borrowed))
        .route("/borrowed", get(book_instances::all_borrowed))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", delete(users::delete_user))
        .route("/users/:id/permissions", put(users::update_permissions))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        repository::Repository,
        services::{redis::RedisService, Services},
    };

    // Routes exercised here answer before touching the database.
    fn app() -> Router {
        let config = AppConfig::default();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database.url)
            .unwrap();
        let redis = RedisService::new(&config.redis.url).unwrap();
        let services = Services::new(Repository::new(pool), &config, redis);
        router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }

    fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get("/api/v1/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_writes_require_login() {
        let response = app()
            .oneshot(post_json("/api/v1/authors", None, r#"{"first_name":"A","last_name":"B"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], 2);
    }

    #[tokio::test]
    async fn test_my_books_requires_login() {
        let response = app().oneshot(get("/api/v1/mybooks", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(get("/api/v1/mybooks", Some("Bearer not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app()
            .oneshot(get("/api/v1/borrowed", Some("Basic YWRtaW46YWRtaW4=")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = UserClaims {
            sub: "testuser1".to_string(),
            user_id: 1,
            is_superuser: true,
            permissions: vec![],
            exp: now + 3600,
            iat: now,
        };
        let auth = format!("Bearer {}", claims.create_token("other-secret").unwrap());
        let response = app().oneshot(get("/api/v1/author-form", Some(&auth))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
