//! Type definitions for the agent run.

use crate::context::ContextError;
use crate::ports::llm_gateway::GatewayError;
use serde::Serialize;
use thiserror::Error;
use vigil_domain::{AgenticContext, RunStatus, RunSummary};

/// Errors that end a run early.
///
/// They never escape [`AgenticCore::run`](super::AgenticCore::run); the run
/// records them as its terminal reason.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    #[error("Plan rejected after {attempts} attempts: {errors}")]
    PlanRejected { attempts: u32, errors: String },

    #[error("Reflection failed: {0}")]
    ReflectionFailed(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AgentError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

/// Outcome of [`AgenticCore::run`](super::AgenticCore::run).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunResult {
    /// True only when the run reached `completed`
    pub success: bool,
    pub context: AgenticContext,
    /// Terminal reason of a failed or aborted run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentRunResult {
    pub(super) fn from_context(context: AgenticContext) -> Self {
        let success = context.status == RunStatus::Completed;
        let error = if success {
            None
        } else {
            context.errors.last().map(|e| e.error.clone())
        };
        Self {
            success,
            context,
            error,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.context.status
    }

    pub fn summary(&self) -> RunSummary {
        self.context.summary()
    }
}

/// What the main loop does after a step's reflections are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    Next,
    Stop,
}
