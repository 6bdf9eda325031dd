//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health          - Liveness check
//!
//! # Products
//! GET    /products        - List products
//! POST   /products        - Create (multipart, urlencoded or JSON)
//! GET    /products/{id}   - Show product
//! PUT    /products/{id}   - Replace fields (full validation, merge)
//! DELETE /products/{id}   - Delete product
//!
//! # Users
//! GET    /users           - List users
//! POST   /users           - Create (password hashed)
//! GET    /users/{id}      - Show user
//! PATCH  /users/{id}      - Partial update
//! DELETE /users/{id}      - Delete user
//!
//! # Static files
//! GET    /*               - Files under the public directory,
//!                           uploaded images under /images/
//! ```

pub mod products;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Request, Response},
    middleware,
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route(
            "/{id}",
            get(users::show)
                .patch(users::update)
                .delete(users::destroy),
        )
}

/// Build the full application router, layers included.
///
/// Sentry layers are added by the binary around this router.
pub fn app(state: AppState) -> Router {
    let public_dir = state.config().public_dir.clone();
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .nest("/products", product_routes())
        .nest("/users", user_routes())
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running.
async fn health() -> &'static str {
    "ok"
}
