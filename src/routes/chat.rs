use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use crate::models::{AppState, ChatRequest, ChatResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat/", post(post_chat))
        .route("/chat", post(post_chat))
        .with_state(state)
}

pub async fn post_chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<ChatResponse> {
    info!(
        document_len = request.document_text.len(),
        question_len = request.user_message.len(),
        "Received chat request"
    );

    Json(state.chat.answer(&request.document_text, &request.user_message).await)
}
