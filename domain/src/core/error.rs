//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No JSON object found in model response")]
    NoJsonFound,

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid reflection: {0}")]
    InvalidReflection(String),

    #[error("Unknown risk level: {0}")]
    UnknownRiskLevel(String),

    #[error("Unknown parameter type: {0}")]
    UnknownParamType(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }

    /// Whether the error came from unparsable model output
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            DomainError::NoJsonFound | DomainError::InvalidPlan(_) | DomainError::InvalidReflection(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_parse_error_classification() {
        assert!(DomainError::NoJsonFound.is_parse_error());
        assert!(DomainError::InvalidPlan("no steps".into()).is_parse_error());
        assert!(!DomainError::Cancelled.is_parse_error());
        assert!(!DomainError::UnknownRiskLevel("extreme".into()).is_parse_error());
    }
}
