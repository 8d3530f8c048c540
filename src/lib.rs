// Docsift - document text extraction service with document-grounded chat

pub mod agents;
pub mod config;
pub mod extraction;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use extraction::{extract, ExtractionResult};
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
