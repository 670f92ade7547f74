//! Provider identity and availability.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A language-model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl ProviderKind {
    /// Default fallback chain: primary cloud, alternate cloud, local last.
    pub const DEFAULT_CHAIN: [ProviderKind; 3] =
        [ProviderKind::Anthropic, ProviderKind::OpenAi, ProviderKind::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Ollama => "Ollama (local)",
        }
    }

    /// Local providers need no credential and are probed over HTTP.
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderKind::Ollama)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "open_ai" | "gpt" => Ok(ProviderKind::OpenAi),
            "ollama" | "local" => Ok(ProviderKind::Ollama),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub available: bool,
    /// Models usable through this provider
    pub models: Vec<String>,
    /// Why the provider is unavailable, when it is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ProviderStatus {
    pub fn available(provider: ProviderKind, models: Vec<String>) -> Self {
        Self {
            provider,
            available: true,
            models,
            reason: None,
        }
    }

    pub fn unavailable(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self {
            provider,
            available: false,
            models: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    /// Available with at least one model.
    pub fn is_usable(&self) -> bool {
        self.available && !self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert_eq!("local".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_default_chain_ends_local() {
        let chain = ProviderKind::DEFAULT_CHAIN;
        assert!(!chain[0].is_local());
        assert!(chain.last().unwrap().is_local());
    }

    #[test]
    fn test_usable_requires_models() {
        assert!(!ProviderStatus::available(ProviderKind::Ollama, vec![]).is_usable());
        assert!(ProviderStatus::available(ProviderKind::Ollama, vec!["llama3.1".into()]).is_usable());
        assert!(!ProviderStatus::unavailable(ProviderKind::OpenAi, "no key").is_usable());
    }
}
