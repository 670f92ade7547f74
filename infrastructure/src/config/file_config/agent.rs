//! Agent configuration from TOML (`[agent]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vigil_application::ExecutionParams;
use vigil_application::config::execution_params::{DEFAULT_MAX_PLAN_ATTEMPTS, DEFAULT_MAX_RETRIES};

/// Raw agent configuration from TOML
///
/// # Example
///
/// ```toml
/// [agent]
/// auto_approve = false
/// parallel = true
/// max_retries = 3
/// max_plan_attempts = 3
/// step_timeout_ms = 120000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Approve every gated task and step without asking
    pub auto_approve: bool,
    /// Run independent parallel steps concurrently
    pub parallel: bool,
    pub max_retries: u32,
    pub max_plan_attempts: u32,
    /// Tool call timeout; unset uses each step's estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_timeout_ms: Option<u64>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            auto_approve: false,
            parallel: false,
            max_retries: DEFAULT_MAX_RETRIES,
            max_plan_attempts: DEFAULT_MAX_PLAN_ATTEMPTS,
            step_timeout_ms: None,
        }
    }
}

impl FileAgentConfig {
    pub fn to_execution_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_auto_approve(self.auto_approve)
            .with_max_retries(self.max_retries)
            .with_max_plan_attempts(self.max_plan_attempts)
            .with_step_timeout(self.step_timeout_ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_execution_params() {
        let params = FileAgentConfig::default().to_execution_params();
        assert_eq!(params, ExecutionParams::default());
    }

    #[test]
    fn test_step_timeout_conversion() {
        let config: FileAgentConfig = toml::from_str("step_timeout_ms = 1500\nmax_retries = 1").unwrap();
        let params = config.to_execution_params();
        assert_eq!(params.step_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(params.max_retries, 1);
        assert_eq!(params.max_plan_attempts, 3);
    }
}
