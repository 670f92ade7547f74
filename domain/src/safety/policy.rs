//! Safety policy configuration.

use serde::{Deserialize, Serialize};

/// Keywords that flag a task description for closer review.
///
/// Matching is case-insensitive substring search: a lexical heuristic,
/// not intent detection.
pub const DANGEROUS_KEYWORDS: &[&str] = &[
    "rm -rf",
    "wipe",
    "destroy",
    "ransomware",
    "malware",
    "backdoor",
    "ddos",
    "denial of service",
    "drop table",
    "drop database",
    "format disk",
    "brute force",
    "exfiltrate",
    "delete all",
];

/// Risk added per dangerous keyword hit.
pub const KEYWORD_RISK: u32 = 20;

/// Minimum risk of a step that demands approval.
pub const APPROVAL_RISK_FLOOR: u8 = 60;

/// Longest accepted task description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5_000;

/// Targets that warrant a warning regardless of policy: loopback, private
/// and link-local ranges, and government/military/education domains.
pub const SENSITIVE_TARGET_PATTERNS: &[(&str, &str)] = &[
    (r"(?i)\blocalhost\b", "loopback host"),
    (r"\b127\.\d{1,3}\.\d{1,3}\.\d{1,3}\b", "loopback address"),
    (r"(?:^|\[|//)::1(?:\]|$|/)", "loopback address"),
    (r"\b10\.\d{1,3}\.\d{1,3}\.\d{1,3}\b", "private network range"),
    (r"\b192\.168\.\d{1,3}\.\d{1,3}\b", "private network range"),
    (
        r"\b172\.(?:1[6-9]|2\d|3[01])\.\d{1,3}\.\d{1,3}\b",
        "private network range",
    ),
    (r"\b169\.254\.\d{1,3}\.\d{1,3}\b", "link-local address"),
    (
        r"(?i)\.(?:gov|mil|edu)(?:\.[a-z]{2})?(?:[:/]|$)",
        "government, military or education domain",
    ),
];

/// Policy applied by the safety validator.
///
/// Every field is optional in configuration; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyPolicy {
    /// Permit steps classified as high risk
    pub allow_high_risk_ops: bool,
    /// Ceiling for task and plan step counts
    pub max_steps: usize,
    /// Ceiling for task duration, in milliseconds
    pub max_duration_ms: u64,
    /// When non-empty, only these tools may be used
    pub allowed_tools: Vec<String>,
    pub blocked_tools: Vec<String>,
    /// Regex patterns; when non-empty, every target must match one
    pub allowed_targets: Vec<String>,
    /// Regex patterns; a match always rejects the target
    pub blocked_targets: Vec<String>,
    /// Risk score at or above which approval is required
    pub require_approval_above_risk: u8,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            allow_high_risk_ops: false,
            max_steps: 50,
            max_duration_ms: 3_600_000,
            allowed_tools: Vec::new(),
            blocked_tools: Vec::new(),
            allowed_targets: Vec::new(),
            blocked_targets: Vec::new(),
            require_approval_above_risk: 50,
        }
    }
}

impl SafetyPolicy {
    pub fn with_high_risk_ops(mut self, allow: bool) -> Self {
        self.allow_high_risk_ops = allow;
        self
    }

    pub fn with_blocked_target(mut self, pattern: impl Into<String>) -> Self {
        self.blocked_targets.push(pattern.into());
        self
    }

    pub fn with_allowed_target(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_targets.push(pattern.into());
        self
    }

    pub fn with_blocked_tool(mut self, tool: impl Into<String>) -> Self {
        self.blocked_tools.push(tool.into());
        self
    }

    pub fn with_allowed_tool(mut self, tool: impl Into<String>) -> Self {
        self.allowed_tools.push(tool.into());
        self
    }

    pub fn with_approval_threshold(mut self, threshold: u8) -> Self {
        self.require_approval_above_risk = threshold;
        self
    }

    pub fn is_tool_blocked(&self, tool: &str) -> bool {
        self.blocked_tools.iter().any(|t| t == tool)
    }

    pub fn is_tool_allowed(&self, tool: &str) -> bool {
        self.allowed_tools.is_empty() || self.allowed_tools.iter().any(|t| t == tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = SafetyPolicy::default();
        assert!(!policy.allow_high_risk_ops);
        assert_eq!(policy.max_steps, 50);
        assert_eq!(policy.max_duration_ms, 3_600_000);
        assert_eq!(policy.require_approval_above_risk, 50);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let policy: SafetyPolicy =
            serde_json::from_str(r#"{"allow_high_risk_ops": true, "blocked_tools": ["exploit_run"]}"#)
                .unwrap();
        assert!(policy.allow_high_risk_ops);
        assert_eq!(policy.max_steps, 50);
        assert!(policy.is_tool_blocked("exploit_run"));
    }

    #[test]
    fn test_tool_allow_list() {
        let open = SafetyPolicy::default();
        assert!(open.is_tool_allowed("anything"));
        let restricted = SafetyPolicy::default().with_allowed_tool("recon_web");
        assert!(restricted.is_tool_allowed("recon_web"));
        assert!(!restricted.is_tool_allowed("portscan"));
    }
}
