//! OpenAI Chat Completions backend.

use super::http::{REQUEST_TIMEOUT, api_key, client, read_json, send_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_application::{GatewayError, LlmBackend};
use vigil_domain::providers::OpenAiProviderConfig;
use vigil_domain::{Message, ProviderKind, ProviderStatus};

const KIND: ProviderKind = ProviderKind::OpenAi;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API client
pub struct OpenAiBackend {
    config: OpenAiProviderConfig,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiProviderConfig) -> Self {
        Self {
            config,
            client: client(REQUEST_TIMEOUT),
        }
    }

    fn request<'a>(&'a self, history: &'a [Message], system_prompt: &'a str) -> ChatRequest<'a> {
        let system = (!system_prompt.is_empty()).then_some(WireMessage {
            role: "system",
            content: system_prompt,
        });
        ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: system
                .into_iter()
                .chain(history.iter().map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                }))
                .collect(),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    async fn check_availability(&self) -> ProviderStatus {
        match api_key(&self.config.api_key_env) {
            Some(_) => ProviderStatus::available(KIND, vec![self.config.model.clone()]),
            None => ProviderStatus::unavailable(
                KIND,
                format!("{} is not set", self.config.api_key_env),
            ),
        }
    }

    async fn complete(
        &self,
        history: &[Message],
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        let key = api_key(&self.config.api_key_env).ok_or_else(|| {
            GatewayError::provider(
                KIND,
                format!("authentication: {} is not set", self.config.api_key_env),
            )
        })?;

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(%url, model = %self.config.model, messages = history.len(), "Sending request to OpenAI");

        let response = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(&self.request(history, system_prompt))
            .send()
            .await
            .map_err(|e| send_error(KIND, e))?;

        let body: ChatResponse = read_json(KIND, response).await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse {
                provider: KIND,
                detail: "response contained no message content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> OpenAiBackend {
        OpenAiBackend::new(OpenAiProviderConfig {
            api_key_env: "VIGIL_TEST_OPENAI_KEY_UNSET".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_system_prompt_leads_messages() {
        let backend = backend();
        let history = vec![Message::user("reflect")];
        let body = serde_json::to_value(backend.request(&history, "be brief")).unwrap();
        assert_eq!(body["messages"][0], json!({"role": "system", "content": "be brief"}));
        assert_eq!(body["messages"][1]["role"], json!("user"));
    }

    #[test]
    fn test_no_system_message_when_empty() {
        let backend = backend();
        let history = vec![Message::user("reflect")];
        let body = serde_json::to_value(backend.request(&history, "")).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_decoding() {
        let body: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"steps\": []}"}}]
        }))
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("{\"steps\": []}"));
    }

    #[tokio::test]
    async fn test_unavailable_without_key() {
        assert!(!backend().check_availability().await.is_usable());
    }
}
