use std::sync::Arc;

use crate::agents::DocumentChatAgent;
use crate::config::Config;
use crate::types::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chat: Arc<DocumentChatAgent>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let chat = Arc::new(DocumentChatAgent::from_config(&config.llm)?);
        Ok(Self { config, chat })
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub document_text: String,
    pub user_message: String,
}

/// Either `{"answer": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatResponse {
    Answer(String),
    Error(String),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
}
