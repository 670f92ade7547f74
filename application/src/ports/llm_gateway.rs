//! LLM Gateway port
//!
//! Defines the interface for communicating with language-model providers.
//! [`LlmBackend`] is one provider; [`LlmGateway`] is what the agent talks to
//! (typically the fallback gateway wrapping several backends).

use async_trait::async_trait;
use vigil_domain::{Message, ProviderErrorKind, ProviderKind, ProviderStatus};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("{provider} request failed ({kind}): {detail}")]
    Provider {
        provider: ProviderKind,
        kind: ProviderErrorKind,
        detail: String,
    },

    #[error("Invalid response from {provider}: {detail}")]
    InvalidResponse {
        provider: ProviderKind,
        detail: String,
    },

    #[error("No language-model provider is available")]
    NoProviderAvailable,

    #[error("All providers exhausted; last error: {last}")]
    AllProvidersExhausted { last: String },
}

impl GatewayError {
    /// Build a provider error, classifying the message.
    pub fn provider(provider: ProviderKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        GatewayError::Provider {
            provider,
            kind: ProviderErrorKind::classify(&detail),
            detail,
        }
    }

    /// Classification of provider errors; `None` for gateway-level errors.
    pub fn kind(&self) -> Option<ProviderErrorKind> {
        match self {
            GatewayError::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether another provider might succeed where this one failed.
    pub fn warrants_fallback(&self) -> bool {
        self.kind().is_some_and(|k| k.warrants_fallback())
    }
}

/// One language-model provider.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Cloud backends are available iff credentialed; local backends are
    /// probed with a short-timeout liveness request.
    async fn check_availability(&self) -> ProviderStatus;

    /// Complete a conversation.
    async fn complete(&self, history: &[Message], system_prompt: &str)
    -> Result<String, GatewayError>;
}

/// Gateway for LLM communication used by the agent.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, history: &[Message], system_prompt: &str)
    -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_classified() {
        let err = GatewayError::provider(ProviderKind::Anthropic, "429 Too Many Requests");
        assert_eq!(err.kind(), Some(ProviderErrorKind::RateLimit));
        assert!(err.warrants_fallback());
        assert!(err.to_string().starts_with("anthropic request failed (rate-limit)"));
    }

    #[test]
    fn test_gateway_level_errors_do_not_fall_back() {
        assert!(!GatewayError::NoProviderAvailable.warrants_fallback());
        let bad = GatewayError::provider(ProviderKind::OpenAi, "400 invalid request body");
        assert!(!bad.warrants_fallback());
    }
}
