//! Step execution results.
//!
//! Execution failures are data, not errors: every attempt produces a
//! [`StepResult`] so the agent loop always reaches reflection.

use crate::plan::StepId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Closed classification of step execution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepErrorKind {
    /// No tool of that name in the registry
    ToolNotFound,
    /// Tool is declared but nothing is registered to run it
    NoExecutor,
    /// A required parameter is absent and has no default
    MissingParameter,
    /// A parameter does not match the declared type
    InvalidParameter,
    /// The tool did not settle within the timeout
    Timeout,
    /// The approval callback declined the step
    ApprovalDenied,
    /// The tool itself reported an error
    ToolFailure,
}

impl StepErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepErrorKind::ToolNotFound => "tool-not-found",
            StepErrorKind::NoExecutor => "no-executor",
            StepErrorKind::MissingParameter => "missing-parameter",
            StepErrorKind::InvalidParameter => "invalid-parameter",
            StepErrorKind::Timeout => "timeout",
            StepErrorKind::ApprovalDenied => "approval-denied",
            StepErrorKind::ToolFailure => "tool-failure",
        }
    }
}

impl std::fmt::Display for StepErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified failure with the original message preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    pub kind: StepErrorKind,
    pub detail: String,
}

impl StepError {
    pub fn new(kind: StepErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn tool_not_found(tool: &str) -> Self {
        Self::new(StepErrorKind::ToolNotFound, format!("Tool not found: {}", tool))
    }

    pub fn no_executor(tool: &str) -> Self {
        Self::new(
            StepErrorKind::NoExecutor,
            format!("No executor registered for tool: {}", tool),
        )
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::new(
            StepErrorKind::MissingParameter,
            format!("Missing required parameter: {}", name),
        )
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            StepErrorKind::Timeout,
            format!("Tool execution timed out after {}ms", after.as_millis()),
        )
    }

    pub fn approval_denied(reason: impl Into<String>) -> Self {
        Self::new(StepErrorKind::ApprovalDenied, reason)
    }

    pub fn tool_failure(message: impl Into<String>) -> Self {
        Self::new(StepErrorKind::ToolFailure, message)
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Outcome of one attempt at a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_id: StepId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    /// Milliseconds of wall-clock time
    pub duration: u64,
    pub timestamp: DateTime<Utc>,
    pub tool_used: String,
    pub attempt_number: u32,
}

impl StepResult {
    pub fn success(
        step_id: StepId,
        tool: impl Into<String>,
        output: Value,
        duration: Duration,
        attempt_number: u32,
    ) -> Self {
        Self {
            step_id,
            success: true,
            output: Some(output),
            error: None,
            duration: duration.as_millis() as u64,
            timestamp: Utc::now(),
            tool_used: tool.into(),
            attempt_number,
        }
    }

    pub fn failure(
        step_id: StepId,
        tool: impl Into<String>,
        error: StepError,
        duration: Duration,
        attempt_number: u32,
    ) -> Self {
        Self {
            step_id,
            success: false,
            output: None,
            error: Some(error),
            duration: duration.as_millis() as u64,
            timestamp: Utc::now(),
            tool_used: tool.into(),
            attempt_number,
        }
    }

    pub fn error_kind(&self) -> Option<StepErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Output rendered for prompts and console display.
    pub fn output_text(&self) -> String {
        match &self.output {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}
