//! Anthropic Messages API backend.

use super::http::{REQUEST_TIMEOUT, api_key, client, read_json, send_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_application::{GatewayError, LlmBackend};
use vigil_domain::providers::AnthropicProviderConfig;
use vigil_domain::{Message, ProviderKind, ProviderStatus};

const KIND: ProviderKind = ProviderKind::Anthropic;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic API client
pub struct AnthropicBackend {
    config: AnthropicProviderConfig,
    client: Client,
}

impl AnthropicBackend {
    pub fn new(config: AnthropicProviderConfig) -> Self {
        Self {
            config,
            client: client(REQUEST_TIMEOUT),
        }
    }

    fn request<'a>(&'a self, history: &'a [Message], system_prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: system_prompt,
            messages: history
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
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

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        debug!(%url, model = %self.config.model, messages = history.len(), "Sending request to Anthropic");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", key)
            .header("anthropic-version", &self.config.api_version)
            .json(&self.request(history, system_prompt))
            .send()
            .await
            .map_err(|e| send_error(KIND, e))?;

        let body: MessagesResponse = read_json(KIND, response).await?;
        let text: String = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(GatewayError::InvalidResponse {
                provider: KIND,
                detail: "response contained no text".to_string(),
            });
        }
        Ok(text)
    }
}
