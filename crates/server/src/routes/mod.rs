//! HTTP route handlers for the identity service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database)
//!
//! # Auth
//! POST /auth/signup              - Create customer
//! POST /auth/login               - Customer login by CPF
//! POST /auth/login/unknown       - Guest login
//! POST /auth/admin/signup        - Create admin user
//! POST /auth/admin/login         - Admin user login by CPF
//!
//! # Customers
//! GET  /api/admin/customers/{id} - Customer by ID
//! PUT  /api/admin/customers/{id} - Update customer
//! GET  /api/customers/{cpf}      - Customer by CPF
//!
//! # Admin users
//! GET  /api/users/{id}           - Admin user by ID
//! PUT  /api/users/{id}           - Update admin user
//! POST /api/users/login          - Admin user by CPF (body)
//! ```

pub mod accounts;
pub mod auth;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/login/unknown", post(auth::login_unknown))
        .route("/admin/signup", post(auth::admin_signup))
        .route("/admin/login", post(auth::admin_login))
}

/// Create the account API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/customers/{id}",
            get(accounts::get_customer).put(accounts::update_customer),
        )
        .route("/customers/{cpf}", get(accounts::get_customer_by_cpf))
        .route(
            "/users/{id}",
            get(accounts::get_admin_user).put(accounts::update_admin_user),
        )
        .route("/users/login", post(accounts::get_admin_user_by_cpf))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
}

/// Build the application with its request ID and tracing layers.
///
/// Sentry layers are added by the binary, outermost.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
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
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                )
                // Failures are logged where they are classified.
                .on_failure(()),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.customers().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
