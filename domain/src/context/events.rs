//! Progress events emitted on every run state change.

use super::entities::Progress;
use crate::execution::{Finding, StepResult};
use crate::plan::Step;
use crate::reflection::Reflection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    Plan,
    StepStart,
    StepComplete,
    Reflection,
    Finding,
    Completed,
    Failed,
    Aborted,
}

impl ProgressEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressEventKind::Plan => "plan",
            ProgressEventKind::StepStart => "step_start",
            ProgressEventKind::StepComplete => "step_complete",
            ProgressEventKind::Reflection => "reflection",
            ProgressEventKind::Finding => "finding",
            ProgressEventKind::Completed => "completed",
            ProgressEventKind::Failed => "failed",
            ProgressEventKind::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEventKind::Completed | ProgressEventKind::Failed | ProgressEventKind::Aborted
        )
    }
}

impl std::fmt::Display for ProgressEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single entry of the progress stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: ProgressEventKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<Reflection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finding: Option<Finding>,
    pub progress: Progress,
    /// Elapsed run time in milliseconds, set on terminal events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: ProgressEventKind, message: impl Into<String>, progress: Progress) -> Self {
        Self {
            kind,
            message: message.into(),
            step: None,
            result: None,
            reflection: None,
            finding: None,
            progress,
            duration: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_result(mut self, result: StepResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_reflection(mut self, reflection: Reflection) -> Self {
        self.reflection = Some(reflection);
        self
    }

    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.finding = Some(finding);
        self
    }

    pub fn with_duration(mut self, millis: u64) -> Self {
        self.duration = Some(millis);
        self
    }
}
