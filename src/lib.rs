//! StudyShare Server
//!
//! A study-materials sharing backend: users register and log in with
//! cookie-carried session tokens, uploaded files go to S3-compatible object
//! storage, and the catalog of courses, semesters, and subjects keeps only
//! the retrieval URLs.

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;

pub use state::AppState;

/// Build the application router with CORS and request tracing applied.
pub fn app(state: AppState) -> Router {
    // Single fixed origin with credentialed requests; credentials mode
    // forbids wildcard origins and headers.
    let origin = state
        .config()
        .server
        .cors_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173"));

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    Router::new()
        .route("/", get(routes::health::greeting))
        .route("/health", get(routes::health::health_check))
        .merge(routes::auth::router())
        .merge(routes::catalog::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
