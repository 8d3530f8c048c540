use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    /// Override for OpenAI-compatible endpoints.
    pub api_base: Option<String>,
}

pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let adapter: Arc<dyn LLMAdapter> = match provider.name.as_str() {
            "openai" => Arc::new(crate::llm::openai::OpenAIAdapter::with_api_base(
                &provider.api_key,
                provider.api_base.as_deref(),
            )),
            other => {
                return Err(AppError::Internal(format!("Unsupported provider: {}", other)));
            }
        };

        Ok(Self {
            adapter,
            provider_name: provider.name,
        })
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }
}

#[async_trait]
impl LLMAdapter for LLM {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_is_supported() {
        let llm = LLM::new(LLMProviderConfig {
            name: "openai".into(),
            api_key: "sk-test".into(),
            api_base: None,
        })
        .unwrap();
        assert_eq!(llm.provider_name(), "openai");
    }

    #[test]
    fn test_unknown_provider_is_an_error() {
        let err = LLM::new(LLMProviderConfig {
            name: "carrier-pigeon".into(),
            api_key: String::new(),
            api_base: None,
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("Unsupported provider: carrier-pigeon"));
    }
}
