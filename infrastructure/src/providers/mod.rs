//! Language-model backends.
//!
//! Each backend implements [`LlmBackend`] for one provider. Cloud backends
//! are available iff their API key environment variable is set; the local
//! Ollama backend is probed over HTTP.

pub mod anthropic;
mod http;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use std::sync::Arc;
use vigil_application::LlmBackend;
use vigil_domain::{ProviderConfig, ProviderKind};

/// Build the backends named in the fallback chain, in chain order.
pub fn backends_for(config: &ProviderConfig) -> Vec<Arc<dyn LlmBackend>> {
    let mut backends: Vec<Arc<dyn LlmBackend>> = Vec::new();
    for kind in &config.chain {
        if backends.iter().any(|b| b.kind() == *kind) {
            continue;
        }
        let backend: Arc<dyn LlmBackend> = match kind {
            ProviderKind::Anthropic => Arc::new(AnthropicBackend::new(config.anthropic.clone())),
            ProviderKind::OpenAi => Arc::new(OpenAiBackend::new(config.openai.clone())),
            ProviderKind::Ollama => Arc::new(OllamaBackend::new(config.ollama.clone())),
        };
        backends.push(backend);
    }
    backends
}
