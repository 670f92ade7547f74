//! Task entities.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default step budget for a task.
pub const DEFAULT_MAX_STEPS: usize = 20;

/// Default wall-clock budget for a task (30 minutes).
pub const DEFAULT_MAX_DURATION_MS: u64 = 30 * 60 * 1000;

/// How ready steps are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One ready step at a time, in plan order.
    #[default]
    Sequential,
    /// Every ready step flagged `canRunInParallel` runs as one batch.
    Parallel,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, ExecutionMode::Parallel)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Budget a run must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskConstraints {
    pub max_steps: usize,
    /// Milliseconds
    pub max_duration: u64,
}

impl Default for TaskConstraints {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_duration: DEFAULT_MAX_DURATION_MS,
        }
    }
}

impl TaskConstraints {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration)
    }
}

/// A natural-language request submitted to the agent.
///
/// Immutable once submitted: the context manager only ever hands out
/// shared references to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub description: String,
    #[serde(default)]
    pub constraints: TaskConstraints,
    #[serde(default)]
    pub mode: ExecutionMode,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            constraints: TaskConstraints::default(),
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.constraints.max_steps = max_steps;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.constraints.max_duration = max_duration.as_millis() as u64;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_defaults() {
        let task = Task::new("scan example.com");
        assert_eq!(task.constraints.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(task.constraints.max_duration(), Duration::from_secs(1800));
        assert_eq!(task.mode, ExecutionMode::Sequential);
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new("audit")
            .with_max_steps(5)
            .with_max_duration(Duration::from_secs(60))
            .with_mode(ExecutionMode::Parallel);
        assert_eq!(task.constraints.max_steps, 5);
        assert_eq!(task.constraints.max_duration, 60_000);
        assert!(task.mode.is_parallel());
    }

    #[test]
    fn test_task_serde_camel_case() {
        let json = serde_json::to_value(Task::new("x")).unwrap();
        assert!(json["constraints"]["maxSteps"].is_number());
        assert_eq!(json["mode"], "sequential");
    }
}
