use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

use crate::llm::{AppError, AppResult, LLMAdapter, LLMRequest, LLMResponse};
use crate::types::{LLMMessage, TokenUsage};

pub struct OpenAIAdapter {
    client: Client<OpenAIConfig>,
}

impl OpenAIAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::with_api_base(api_key, None)
    }

    pub fn with_api_base(api_key: &str, api_base: Option<&str>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self {
            client: Client::with_config(config),
        }
    }
}

fn to_openai_message(message: &LLMMessage) -> AppResult<ChatCompletionRequestMessage> {
    let content = message.content.as_str();
    let converted: ChatCompletionRequestMessage = match message.role.as_str() {
        "system" => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        "user" => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        "assistant" => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        other => return Err(AppError::LLMApi(format!("Unknown message role: {}", other))),
    };
    Ok(converted)
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let messages = request
            .messages
            .iter()
            .map(to_openai_message)
            .collect::<AppResult<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(request.model.as_str()).messages(messages);
        if let Some(max_tokens) = request.max_tokens {
            args.max_completion_tokens(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            args.temperature(temperature);
        }

        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion");
        let response = self.client.chat().create(args.build()?).await?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| AppError::LLMApi("response contained no choices".to_string()))?;

        let content = choice.message.content.clone().unwrap_or_default();
        let finish_reason = choice
            .finish_reason
            .as_ref()
            .and_then(|reason| serde_json::to_value(reason).ok())
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request() -> LLMRequest {
        LLMRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![LLMMessage::system("be brief"), LLMMessage::user("hello")],
            max_tokens: None,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn test_completion_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "created": 1700000000,
                    "model": "gpt-3.5-turbo",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "Hi there."},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = OpenAIAdapter::with_api_base("sk-test", Some(&server.url()));
        let response = adapter.create_chat_completion(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Hi there.");
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.usage.total_tokens, 12);
    }

    #[tokio::test]
    async fn test_api_error_is_mapped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "error": {
                        "message": "Incorrect API key provided",
                        "type": "invalid_request_error",
                        "param": null,
                        "code": "invalid_api_key"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let adapter = OpenAIAdapter::with_api_base("sk-wrong", Some(&server.url()));
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::LLMApi(_)));
        assert!(err.to_string().contains("Incorrect API key provided"), "{}", err);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = to_openai_message(&LLMMessage::new("tool", "x")).unwrap_err();
        assert!(err.to_string().contains("Unknown message role: tool"));
    }
}
