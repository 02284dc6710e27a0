//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, checkouts, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "0.1.0",
        description = "Library catalog and patron checkout REST API"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Checkouts
        checkouts::list_checkouts,
        checkouts::checkout_book,
        checkouts::return_book,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::SignupRequest,
            crate::models::user::LoginRequest,
            crate::models::user::AuthResponse,
            crate::models::user::MeResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookInput,
            // Checkouts
            crate::models::checkout::BookRequest,
            crate::models::checkout::CheckoutEntry,
            crate::models::checkout::CheckoutResponse,
            crate::models::checkout::ReturnResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::SignupValidity,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login and current user"),
        (name = "books", description = "Catalog management"),
        (name = "checkouts", description = "Patron checkouts and returns")
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
