//! Risk classification shared by tools, steps and plans.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Upper bound of every risk score.
pub const MAX_RISK_SCORE: u8 = 100;

/// Risk classification of a tool, step or plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Base risk score contributed by this level.
    pub fn base_score(&self) -> u8 {
        match self {
            RiskLevel::Low => 20,
            RiskLevel::Medium => 50,
            RiskLevel::High => 80,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, RiskLevel::High)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(DomainError::UnknownRiskLevel(other.to_string())),
        }
    }
}

/// Clamp an intermediate risk computation into `0..=100`.
pub fn clamp_risk(score: u32) -> u8 {
    score.min(MAX_RISK_SCORE as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_scores() {
        assert_eq!(RiskLevel::Low.base_score(), 20);
        assert_eq!(RiskLevel::Medium.base_score(), 50);
        assert_eq!(RiskLevel::High.base_score(), 80);
    }

    #[test]
    fn test_ordering_and_parse() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert!("extreme".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_risk(140), 100);
        assert_eq!(clamp_risk(60), 60);
    }
}
