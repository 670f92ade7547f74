//! Approval port for gating risky work on a human decision.
//!
//! The agent blocks on this port whenever a task or step requires approval
//! and auto-approval is off. Waiting is unbounded unless the implementation
//! enforces its own timeout.
//!
//! # Built-in Implementations
//!
//! - [`AutoApprove`] - Always approves
//! - [`AutoDeny`] - Always declines
//!
//! For interactive use, see the console approval in the CLI.

use async_trait::async_trait;
use thiserror::Error;
use vigil_domain::{Step, Task, ValidationResult};

/// Failures while asking for approval (not the decision itself).
#[derive(Error, Debug, Clone)]
pub enum ApprovalError {
    #[error("Approval cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(String),
}

/// Port for approval decisions.
#[async_trait]
pub trait ApprovalPort: Send + Sync {
    /// Approve running a task whose validation demands approval.
    async fn approve_task(
        &self,
        task: &Task,
        validation: &ValidationResult,
    ) -> Result<bool, ApprovalError>;

    /// Approve running one step.
    async fn approve_step(
        &self,
        step: &Step,
        validation: &ValidationResult,
    ) -> Result<bool, ApprovalError>;
}

/// Approves everything.
pub struct AutoApprove;

#[async_trait]
impl ApprovalPort for AutoApprove {
    async fn approve_task(&self, _: &Task, _: &ValidationResult) -> Result<bool, ApprovalError> {
        Ok(true)
    }

    async fn approve_step(&self, _: &Step, _: &ValidationResult) -> Result<bool, ApprovalError> {
        Ok(true)
    }
}

/// Declines everything.
pub struct AutoDeny;

#[async_trait]
impl ApprovalPort for AutoDeny {
    async fn approve_task(&self, _: &Task, _: &ValidationResult) -> Result<bool, ApprovalError> {
        Ok(false)
    }

    async fn approve_step(&self, _: &Step, _: &ValidationResult) -> Result<bool, ApprovalError> {
        Ok(false)
    }
}
