//! Validation result shared by every safety check.

use crate::core::risk::clamp_risk;
use serde::{Deserialize, Serialize};

/// Outcome of a safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Always within `0..=100`
    pub risk_score: u8,
    pub requires_approval: bool,
}

impl ValidationResult {
    /// Build a result; validity and approval are derived, never set directly.
    pub fn evaluate(errors: Vec<String>, warnings: Vec<String>, risk: u32, threshold: u8) -> Self {
        let risk_score = clamp_risk(risk);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
            risk_score,
            requires_approval: risk_score >= threshold,
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_derives_flags() {
        let result = ValidationResult::evaluate(vec![], vec!["w".into()], 50, 50);
        assert!(result.valid);
        assert!(result.requires_approval);
        assert!(result.has_warnings());

        let result = ValidationResult::evaluate(vec!["e".into()], vec![], 49, 50);
        assert!(!result.valid);
        assert!(!result.requires_approval);
    }

    #[test]
    fn test_evaluate_clamps() {
        let result = ValidationResult::evaluate(vec![], vec![], 260, 50);
        assert_eq!(result.risk_score, 100);
    }
}
