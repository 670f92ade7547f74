//! Provider error classification.
//!
//! Providers report failures as free text; classification is
//! case-insensitive substring matching against known phrases. Best effort,
//! not based on structured error codes.

use serde::{Deserialize, Serialize};

const CREDIT_PHRASES: &[&str] = &[
    "credit balance",
    "insufficient credit",
    "insufficient_quota",
    "exceeded your current quota",
    "billing",
    "payment required",
    "402",
];

const AUTH_PHRASES: &[&str] = &[
    "401",
    "unauthorized",
    "invalid api key",
    "invalid_api_key",
    "invalid x-api-key",
    "incorrect api key",
    "authentication",
    "permission denied",
    "api key not",
    // Credential variable missing from the environment
    "is not set",
];

const RATE_LIMIT_PHRASES: &[&str] = &[
    "429",
    "rate limit",
    "rate_limit",
    "too many requests",
    "overloaded",
];

const UNAVAILABLE_PHRASES: &[&str] = &[
    "connection refused",
    "error sending request",
    "timed out",
    "503",
    "service unavailable",
    "dns error",
    "not reachable",
    "no models installed",
    "is not installed",
    "no usable model",
];

fn contains_any(message: &str, phrases: &[&str]) -> bool {
    let lowered = message.to_lowercase();
    phrases.iter().any(|p| lowered.contains(p))
}

pub fn is_credit_error(message: &str) -> bool {
    contains_any(message, CREDIT_PHRASES)
}

pub fn is_auth_error(message: &str) -> bool {
    contains_any(message, AUTH_PHRASES)
}

pub fn is_rate_limit_error(message: &str) -> bool {
    contains_any(message, RATE_LIMIT_PHRASES)
}

pub fn is_unavailable_error(message: &str) -> bool {
    contains_any(message, UNAVAILABLE_PHRASES)
}

/// Closed classification of provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderErrorKind {
    Credit,
    Auth,
    RateLimit,
    /// Provider could not be reached
    Unavailable,
    Other,
}

impl ProviderErrorKind {
    /// Classify a provider error message.
    ///
    /// Credit is checked first: some providers report quota exhaustion with
    /// a 429 status.
    pub fn classify(message: &str) -> Self {
        if is_credit_error(message) {
            ProviderErrorKind::Credit
        } else if is_auth_error(message) {
            ProviderErrorKind::Auth
        } else if is_rate_limit_error(message) {
            ProviderErrorKind::RateLimit
        } else if is_unavailable_error(message) {
            ProviderErrorKind::Unavailable
        } else {
            ProviderErrorKind::Other
        }
    }

    /// Whether switching to another provider may help.
    pub fn warrants_fallback(&self) -> bool {
        !matches!(self, ProviderErrorKind::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Credit => "credit",
            ProviderErrorKind::Auth => "auth",
            ProviderErrorKind::RateLimit => "rate-limit",
            ProviderErrorKind::Unavailable => "unavailable",
            ProviderErrorKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
