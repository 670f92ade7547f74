//! Provider configuration types (provider-neutral, serde-free).
//!
//! These types define the shape of provider settings without depending
//! on any serialization format (TOML, JSON, etc.).

use super::entities::ProviderKind;
use std::time::Duration;

/// Top-level provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Fallback chain in priority order.
    pub chain: Vec<ProviderKind>,
    pub anthropic: AnthropicProviderConfig,
    pub openai: OpenAiProviderConfig,
    pub ollama: OllamaProviderConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            chain: ProviderKind::DEFAULT_CHAIN.to_vec(),
            anthropic: AnthropicProviderConfig::default(),
            openai: OpenAiProviderConfig::default(),
            ollama: OllamaProviderConfig::default(),
        }
    }
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone)]
pub struct AnthropicProviderConfig {
    /// Environment variable holding the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_version: String,
}

impl Default for AnthropicProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 4096,
            api_version: "2023-06-01".to_string(),
        }
    }
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    /// Environment variable holding the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 4096,
        }
    }
}

/// Local Ollama server configuration.
#[derive(Debug, Clone)]
pub struct OllamaProviderConfig {
    pub base_url: String,
    /// Preferred model; the first installed model is used when unset.
    pub model: Option<String>,
    /// Liveness probe timeout.
    pub probe_timeout: Duration,
}

impl Default for OllamaProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: None,
            probe_timeout: Duration::from_millis(2000),
        }
    }
}
