//! HTTP Routes
//!
//! - `POST /extract-text/` - multipart upload, returns `{"text"}` or `{"error"}`
//! - `POST /chat/` - question about extracted text, returns `{"answer"}` or `{"error"}`
//! - `GET /api/health` - liveness
//! - `GET /` - upload page

pub mod chat;
pub mod extract;
pub mod health;
pub mod ui;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the application router with body limit, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_upload_bytes = state.config.upload.max_upload_bytes;
    let origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(extract::router(state.clone()))
        .merge(chat::router(state))
        .merge(health::router())
        .merge(ui::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &origins)
}
