//! Document Chat Agent
//!
//! Answers a user question using only the text of an uploaded document. The
//! document is truncated before it is placed in the prompt so very large
//! extractions stay within the model's context.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::LLMConfig;
use crate::llm::provider::{LLMAdapter, LLMProviderConfig, LLM};
use crate::models::ChatResponse;
use crate::types::{AppResult, LLMMessage, LLMRequest};

pub const SYSTEM_PROMPT: &str = "You are an assistant that only answers based on the provided document text.\nIf the information is not in the document, reply: 'The document does not contain information on that topic.'";

pub const MISSING_API_KEY: &str = "OpenAI API key is not configured";

pub struct DocumentChatAgent {
    llm: Option<Arc<dyn LLMAdapter>>,
    model: String,
    max_document_chars: usize,
}

impl DocumentChatAgent {
    pub fn from_config(config: &LLMConfig) -> AppResult<Self> {
        let llm: Option<Arc<dyn LLMAdapter>> = match &config.openai_api_key {
            Some(api_key) => Some(Arc::new(LLM::new(LLMProviderConfig {
                name: "openai".to_string(),
                api_key: api_key.clone(),
                api_base: config.openai_api_base.clone(),
            })?)),
            None => {
                warn!("OPENAI_API_KEY not set; chat requests will report an error");
                None
            }
        };

        Ok(Self {
            llm,
            model: config.chat_model.clone(),
            max_document_chars: config.max_document_chars,
        })
    }

    pub fn with_adapter(adapter: Arc<dyn LLMAdapter>, model: impl Into<String>, max_document_chars: usize) -> Self {
        Self {
            llm: Some(adapter),
            model: model.into(),
            max_document_chars,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Ask `question` about `document_text`. Provider failures are reported
    /// in the response rather than as an error.
    pub async fn answer(&self, document_text: &str, question: &str) -> ChatResponse {
        let Some(llm) = &self.llm else {
            return ChatResponse::Error(MISSING_API_KEY.to_string());
        };

        let document = truncate_chars(document_text, self.max_document_chars);
        info!(
            document_chars = document.chars().count(),
            truncated = document.len() < document_text.len(),
            question_len = question.len(),
            "Answering document question"
        );

        let request = LLMRequest {
            model: self.model.clone(),
            messages: build_messages(document, question),
            max_tokens: None,
            temperature: None,
        };

        match llm.create_chat_completion(&request).await {
            Ok(response) => ChatResponse::Answer(response.content),
            Err(e) => {
                error!(error = %e, "Chat completion failed");
                ChatResponse::Error(e.to_string())
            }
        }
    }
}

pub fn build_messages(document: &str, question: &str) -> Vec<LLMMessage> {
    vec![
        LLMMessage::system(SYSTEM_PROMPT),
        LLMMessage::user(format!("Document:\n{}\n\nUser Question:\n{}", document, question)),
    ]
}

/// At most `max_chars` characters of `text`, cut on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
