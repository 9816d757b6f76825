//! HTTP route handlers for the registry.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to the person listing
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Persons
//! GET  /persons?page=N         - Paginated listing
//! GET  /persons/new            - Creation form (auth)
//! POST /persons/new            - Create, multipart (auth)
//! GET  /persons/{id}           - Detail
//! GET  /persons/{id}/edit      - Edit form (auth)
//! POST /persons/{id}/edit      - Edit, multipart (auth)
//! POST /persons/{id}/delete    - Delete (auth)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod persons;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the person routes router.
pub fn person_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(persons::index))
        .route("/new", get(persons::new_page).post(persons::create))
        .route("/{id}", get(persons::show))
        .route("/{id}/edit", get(persons::edit_page).post(persons::update))
        .route("/{id}/delete", post(persons::delete))
}

/// Create all routes for the registry.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/persons", person_routes())
        .nest("/auth", auth_routes())
}

/// The listing doubles as the home page.
async fn home() -> Redirect {
    Redirect::to("/persons")
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
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
