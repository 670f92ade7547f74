//! Fallback gateway
//!
//! Wraps an ordered chain of [`LlmBackend`]s. A request goes to the current
//! provider; on a credit, auth, rate-limit, or availability failure it is
//! re-issued once on the next available provider in the chain.
//!
//! Availability is probed once and cached until [`FallbackGateway::refresh`].

use crate::ports::llm_gateway::{GatewayError, LlmBackend, LlmGateway};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use vigil_domain::{Message, ProviderKind, ProviderStatus, next_available_provider};

/// Gateway that fails over along a provider chain.
pub struct FallbackGateway {
    backends: Vec<Arc<dyn LlmBackend>>,
    statuses: RwLock<Option<Vec<ProviderStatus>>>,
    current: Mutex<Option<ProviderKind>>,
}

impl FallbackGateway {
    /// Create a gateway; `backends` are tried in the given order.
    pub fn new(backends: Vec<Arc<dyn LlmBackend>>) -> Self {
        Self {
            backends,
            statuses: RwLock::new(None),
            current: Mutex::new(None),
        }
    }

    pub fn chain(&self) -> Vec<ProviderKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Provider that served the last successful request.
    pub fn current_provider(&self) -> Option<ProviderKind> {
        self.current.lock().ok().and_then(|c| *c)
    }

    fn set_current(&self, provider: ProviderKind) {
        if let Ok(mut current) = self.current.lock() {
            *current = Some(provider);
        }
    }

    fn backend(&self, kind: ProviderKind) -> Option<&Arc<dyn LlmBackend>> {
        self.backends.iter().find(|b| b.kind() == kind)
    }

    /// Probe every provider concurrently and cache the result.
    pub async fn check_provider_availability(&self) -> Vec<ProviderStatus> {
        let statuses = join_all(self.backends.iter().map(|b| b.check_availability())).await;
        for status in &statuses {
            debug!(
                provider = %status.provider,
                available = status.available,
                models = status.models.len(),
                reason = status.reason.as_deref().unwrap_or(""),
                "Provider probed"
            );
        }
        *self.statuses.write().await = Some(statuses.clone());
        statuses
    }

    /// Drop the cached availability and probe again.
    pub async fn refresh(&self) -> Vec<ProviderStatus> {
        self.check_provider_availability().await
    }

    async fn statuses(&self) -> Vec<ProviderStatus> {
        if let Some(cached) = self.statuses.read().await.as_ref() {
            return cached.clone();
        }
        self.check_provider_availability().await
    }

    fn starting_provider(&self, statuses: &[ProviderStatus]) -> Option<ProviderKind> {
        let usable = |kind: ProviderKind| statuses.iter().any(|s| s.provider == kind && s.is_usable());
        self.current_provider()
            .filter(|p| usable(*p))
            .or_else(|| self.chain().into_iter().find(|p| usable(*p)))
    }
}

#[async_trait]
impl LlmGateway for FallbackGateway {
    async fn complete(
        &self,
        history: &[Message],
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        let statuses = self.statuses().await;
        let chain = self.chain();
        let mut provider = self
            .starting_provider(&statuses)
            .ok_or(GatewayError::NoProviderAvailable)?;

        loop {
            let backend = self
                .backend(provider)
                .ok_or(GatewayError::NoProviderAvailable)?;

            match backend.complete(history, system_prompt).await {
                Ok(text) => {
                    self.set_current(provider);
                    return Ok(text);
                }
                Err(e) if e.warrants_fallback() => {
                    match next_available_provider(provider, &chain, &statuses) {
                        Some(next) => {
                            warn!(from = %provider, to = %next, error = %e, "Provider failed, falling back");
                            self.set_current(next);
                            provider = next;
                        }
                        None => {
                            info!(provider = %provider, "No fallback provider left");
                            return Err(GatewayError::AllProvidersExhausted {
                                last: e.to_string(),
                            });
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
