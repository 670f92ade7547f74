//! HTTP helpers shared by the backends.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use vigil_application::GatewayError;
use vigil_domain::ProviderKind;
use vigil_domain::core::string::truncate;

/// Longest error body kept in a gateway error.
const MAX_ERROR_BODY: usize = 500;

/// Request timeout for cloud completions.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Read an API key from `env_var`; empty values count as unset.
pub(crate) fn api_key(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

pub(crate) fn send_error(provider: ProviderKind, error: reqwest::Error) -> GatewayError {
    GatewayError::provider(provider, error.to_string())
}

/// Decode a successful JSON response or turn the status and body into a
/// classified provider error.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: ProviderKind,
    response: Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GatewayError::provider(
            provider,
            format!("{} - {}", status, truncate(body.trim(), MAX_ERROR_BODY)),
        ));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::InvalidResponse {
            provider,
            detail: e.to_string(),
        })
}
