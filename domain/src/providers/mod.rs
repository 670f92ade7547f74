//! Language-model provider domain.
//!
//! - [`entities`]: provider identity and availability status
//! - [`config`]: provider settings (serde-free)
//! - [`classification`]: best-effort error classification from messages
//! - [`fallback`]: choosing the next provider in the chain, remediation text

pub mod classification;
pub mod config;
pub mod entities;
pub mod fallback;

pub use classification::{
    ProviderErrorKind, is_auth_error, is_credit_error, is_rate_limit_error, is_unavailable_error,
};
pub use config::{
    AnthropicProviderConfig, OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig,
};
pub use entities::{ProviderKind, ProviderStatus};
pub use fallback::{error_suggestion, next_available_provider};
