//! Person registry server library.
//!
//! This crate provides the registry web application as a library, allowing
//! it to be tested and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::{Router, extract::DefaultBodyLimit};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};

use registry_core::UPLOADS_PREFIX;

use state::AppState;

/// Build the application router.
///
/// Stored photos are served read-only under `/static/uploads`, matching the
/// `uploads/{id}.{ext}` references kept on each record. Request bodies are
/// capped at `max_upload_bytes`.
pub fn build_router<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let config = state.config();
    let uploads = ServeDir::new(&config.upload_dir);
    let max_upload_bytes = config.max_upload_bytes;

    routes::routes()
        .nest_service(&format!("/static/{UPLOADS_PREFIX}"), uploads)
        .layer(sessions)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::RegistryConfig;
    use crate::middleware::session_layer;

    /// Router whose pool never connects; only routes that stay off the
    /// database may be exercised.
    fn app(upload_dir: &std::path::Path) -> Router {
        let config = RegistryConfig {
            database_url: SecretString::from("postgres://localhost/registry_test"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            upload_dir: upload_dir.to_path_buf(),
            max_upload_bytes: 1024,
            sweep_uploads_on_start: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/registry_test")
            .unwrap();
        let state = AppState::new(config, pool);
        build_router(state, session_layer(MemoryStore::default(), false))
    }

    fn location(response: &axum::response::Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_home_redirects_to_listing() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/persons");
    }

    #[tokio::test]
    async fn test_mutations_require_login() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        for (method, uri) in [
            ("GET", "/persons/new"),
            ("POST", "/persons/new"),
            ("GET", "/persons/1/edit"),
            ("POST", "/persons/1/edit"),
            ("POST", "/persons/1/delete"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
                .body(Body::from("--x--\r\n"))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{method} {uri}");
            assert_eq!(location(&response), "/auth/login", "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_unparsable_person_id_redirects_to_listing() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        for uri in ["/persons/99999999999", "/persons/abc"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(location(&response), "/persons", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::get("/auth/login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_serves_uploaded_photo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("7.png"), b"png").unwrap();

        let response = app(dir.path())
            .oneshot(
                Request::get("/static/uploads/7.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejects_oversized_body() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::CONTENT_LENGTH, "4096")
            .body(Body::from(vec![b'a'; 4096]))
            .unwrap();

        let response = app(dir.path()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
