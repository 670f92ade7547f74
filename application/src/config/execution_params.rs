//! Execution parameters: agent loop control.
//!
//! [`ExecutionParams`] groups the static parameters that control the
//! plan/execute/reflect loop in [`AgenticCore`](crate::use_cases::run_agent::AgenticCore).
//! Safety policy lives in the domain; these are application-layer concerns.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default retry bound for a failing step.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default bound on plan requests when plans keep failing validation.
pub const DEFAULT_MAX_PLAN_ATTEMPTS: u32 = 3;

/// Agent loop control parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Skip the approval port for steps and tasks that require approval.
    pub auto_approve: bool,
    /// Maximum attempts per step when reflection asks for a retry.
    pub max_retries: u32,
    /// Maximum plan requests before the run fails.
    pub max_plan_attempts: u32,
    /// Tool call timeout overriding each step's estimate.
    pub step_timeout: Option<Duration>,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            auto_approve: false,
            max_retries: DEFAULT_MAX_RETRIES,
            max_plan_attempts: DEFAULT_MAX_PLAN_ATTEMPTS,
            step_timeout: None,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_max_plan_attempts(mut self, max: u32) -> Self {
        self.max_plan_attempts = max.max(1);
        self
    }

    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }
}
