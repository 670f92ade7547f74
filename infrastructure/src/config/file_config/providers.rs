//! Provider configuration from TOML (`[providers]` section)
//!
//! ```toml
//! [providers]
//! chain = ["ollama", "anthropic"]
//!
//! [providers.anthropic]
//! model = "claude-sonnet-4-5"
//!
//! [providers.ollama]
//! base_url = "http://gpu-box:11434"
//! model = "qwen2.5"
//! probe_timeout_ms = 1000
//! ```
//!
//! API keys are never read from the file, only from the environment
//! variable each cloud provider names.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vigil_domain::ProviderKind;
use vigil_domain::providers::{
    AnthropicProviderConfig, OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig,
};

/// `[providers]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Fallback order by provider name
    pub chain: Vec<String>,
    pub anthropic: FileAnthropicConfig,
    pub openai: FileOpenAiConfig,
    pub ollama: FileOllamaConfig,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            chain: ProviderKind::DEFAULT_CHAIN
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
            anthropic: FileAnthropicConfig::default(),
            openai: FileOpenAiConfig::default(),
            ollama: FileOllamaConfig::default(),
        }
    }
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        let defaults = AnthropicProviderConfig::default();
        Self {
            api_key_env: defaults.api_key_env,
            base_url: defaults.base_url,
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            api_version: defaults.api_version,
        }
    }
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Base URL (can point at any OpenAI-compatible endpoint).
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        let defaults = OpenAiProviderConfig::default();
        Self {
            api_key_env: defaults.api_key_env,
            base_url: defaults.base_url,
            model: defaults.model,
            max_tokens: defaults.max_tokens,
        }
    }
}

/// Local Ollama server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOllamaConfig {
    pub base_url: String,
    /// Preferred model; unset picks the first installed model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub probe_timeout_ms: u64,
}

impl Default for FileOllamaConfig {
    fn default() -> Self {
        let defaults = OllamaProviderConfig::default();
        Self {
            base_url: defaults.base_url,
            model: defaults.model,
            probe_timeout_ms: defaults.probe_timeout.as_millis() as u64,
        }
    }
}

impl FileProvidersConfig {
    /// Resolve provider names and build the domain configuration.
    pub fn to_provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let chain = self
            .chain
            .iter()
            .map(|name| name.parse::<ProviderKind>().map_err(ConfigError::Provider))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProviderConfig {
            chain,
            anthropic: AnthropicProviderConfig {
                api_key_env: self.anthropic.api_key_env.clone(),
                base_url: self.anthropic.base_url.clone(),
                model: self.anthropic.model.clone(),
                max_tokens: self.anthropic.max_tokens,
                api_version: self.anthropic.api_version.clone(),
            },
            openai: OpenAiProviderConfig {
                api_key_env: self.openai.api_key_env.clone(),
                base_url: self.openai.base_url.clone(),
                model: self.openai.model.clone(),
                max_tokens: self.openai.max_tokens,
            },
            ollama: OllamaProviderConfig {
                base_url: self.ollama.base_url.clone(),
                model: self.ollama.model.clone(),
                probe_timeout: Duration::from_millis(self.ollama.probe_timeout_ms),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain() {
        let config = FileProvidersConfig::default().to_provider_config().unwrap();
        assert_eq!(config.chain, ProviderKind::DEFAULT_CHAIN.to_vec());
        assert_eq!(config.ollama.probe_timeout, Duration::from_millis(2000));
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_partial_section() {
        let config: FileProvidersConfig = toml::from_str(
            r#"
chain = ["ollama", "anthropic"]

[ollama]
model = "qwen2.5"
probe_timeout_ms = 500
"#,
        )
        .unwrap();
        let resolved = config.to_provider_config().unwrap();
        assert_eq!(resolved.chain, vec![ProviderKind::Ollama, ProviderKind::Anthropic]);
        assert_eq!(resolved.ollama.model.as_deref(), Some("qwen2.5"));
        assert_eq!(resolved.ollama.probe_timeout, Duration::from_millis(500));
        assert_eq!(resolved.anthropic.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_unknown_provider_is_error() {
        let config = FileProvidersConfig {
            chain: vec!["bedrock".to_string()],
            ..Default::default()
        };
        let err = config.to_provider_config().unwrap_err();
        assert!(err.to_string().contains("bedrock"));
    }
}
