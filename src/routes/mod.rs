//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the comment and upvote endpoints under `/api/custom`,
//! plus a health probe. When `STATIC_DIR` is set, the built frontend is served
//! as the router fallback with `index.html` for unknown paths.

pub mod auth;
pub mod comments;
pub mod upvotes;

use std::path::Path;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Routes mounted under `/api/custom`.
fn custom_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(comments::create_comment))
        .route("/games/{id}/comments", get(comments::game_thread))
        .route("/upvotes/{id}", get(upvotes::upvote_status).post(upvotes::toggle_upvote))
}

/// Full application router.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .nest("/api/custom", custom_routes())
        .route("/healthz", get(healthz));

    // Static fallback sits inside the same layers as the API routes.
    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(static_files(dir));
    }

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_millis(config.request_timeout_ms),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Built frontend assets, falling back to `index.html` for client-side routes.
fn static_files(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(dir.join("index.html")))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
