//! Local Ollama backend.
//!
//! Availability is a short-timeout `GET /api/tags`. Every installed model is
//! reported; completions use the configured one, or the first installed.

use super::http::{client, read_json, send_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use vigil_application::{GatewayError, LlmBackend};
use vigil_domain::providers::OllamaProviderConfig;
use vigil_domain::{Message, ProviderKind, ProviderStatus};

const KIND: ProviderKind = ProviderKind::Ollama;

/// Local generation can be slow on CPU-only hosts.
const CHAT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Ollama HTTP client
pub struct OllamaBackend {
    config: OllamaProviderConfig,
    client: Client,
    /// Model picked by the last successful probe
    resolved_model: Mutex<Option<String>>,
}

impl OllamaBackend {
    pub fn new(config: OllamaProviderConfig) -> Self {
        Self {
            config,
            client: client(CHAT_TIMEOUT),
            resolved_model: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .timeout(self.config.probe_timeout)
            .send()
            .await
            .map_err(|e| send_error(KIND, e))?;
        let tags: TagsResponse = read_json(KIND, response).await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// The configured model when installed, else the first installed one.
    fn pick_model(&self, installed: &[String]) -> Option<String> {
        match &self.config.model {
            Some(wanted) => installed
                .iter()
                .find(|name| {
                    name.as_str() == wanted.as_str()
                        || name.split(':').next() == Some(wanted.as_str())
                })
                .cloned(),
            None => installed.first().cloned(),
        }
    }

    /// Status listing every installed model; the picked model is listed
    /// first and used for completions.
    fn status_for(&self, mut installed: Vec<String>) -> ProviderStatus {
        let picked = self.pick_model(&installed);
        self.remember(picked.clone());

        let Some(model) = picked else {
            let reason = match &self.config.model {
                Some(wanted) => format!("model '{}' is not installed", wanted),
                None => "no models installed".to_string(),
            };
            return ProviderStatus {
                models: installed,
                ..ProviderStatus::unavailable(KIND, reason)
            };
        };

        if let Some(index) = installed.iter().position(|name| *name == model) {
            let picked = installed.remove(index);
            installed.insert(0, picked);
        }
        ProviderStatus::available(KIND, installed)
    }

    fn remember(&self, model: Option<String>) {
        if let Ok(mut resolved) = self.resolved_model.lock() {
            *resolved = model;
        }
    }

    async fn model(&self) -> Result<String, GatewayError> {
        if let Some(model) = self.resolved_model.lock().ok().and_then(|m| m.clone()) {
            return Ok(model);
        }
        let installed = self.list_models().await?;
        let model = self.pick_model(&installed).ok_or_else(|| {
            GatewayError::provider(KIND, "service unavailable: no usable model installed")
        })?;
        self.remember(Some(model.clone()));
        Ok(model)
    }

    fn request<'a>(
        model: &'a str,
        history: &'a [Message],
        system_prompt: &'a str,
    ) -> ChatRequest<'a> {
        let system = (!system_prompt.is_empty()).then_some(WireMessage {
            role: "system",
            content: system_prompt,
        });
        ChatRequest {
            model,
            messages: system
                .into_iter()
                .chain(history.iter().map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                }))
                .collect(),
            stream: false,
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    async fn check_availability(&self) -> ProviderStatus {
        match self.list_models().await {
            Ok(installed) => self.status_for(installed),
            Err(e) => ProviderStatus::unavailable(
                KIND,
                format!("not reachable at {}: {}", self.config.base_url, e),
            ),
        }
    }

    async fn complete(
        &self,
        history: &[Message],
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        let model = self.model().await?;
        debug!(%model, messages = history.len(), "Sending request to Ollama");

        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&Self::request(&model, history, system_prompt))
            .send()
            .await
            .map_err(|e| send_error(KIND, e))?;

        let body: ChatResponse = read_json(KIND, response).await?;
        body.message
            .map(|m| m.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse {
                provider: KIND,
                detail: "response contained no message content".to_string(),
            })
    }
}
