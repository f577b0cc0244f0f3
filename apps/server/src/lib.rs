//! HTTP API server for Till.
//!
//! Exposes the catalog, the checkout engine, and the report aggregator
//! as JSON over HTTP under `/api/v1`, with request tracing and
//! permissive CORS.
//!
//! The router factory is a library function so integration tests can
//! drive the app in-process via `tower::ServiceExt::oneshot`.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Backend, ServerConfig};
pub use state::AppState;

/// Creates the axum application router with all routes and shared state.
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/categories",
            get(routes::categories::list).post(routes::categories::create),
        )
        .route(
            "/categories/{id}",
            get(routes::categories::get)
                .put(routes::categories::update)
                .delete(routes::categories::delete),
        )
        .route(
            "/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route(
            "/products/{id}",
            get(routes::products::get)
                .put(routes::products::update)
                .delete(routes::products::delete),
        )
        .route("/checkout", post(routes::checkout::create))
        .route("/report", get(routes::reports::range))
        .route("/report/today", get(routes::reports::today))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
