//! Run context entities.

use crate::execution::{Finding, Severity, StepResult};
use crate::plan::{Plan, Step, StepId};
use crate::reflection::{NextAction, Reflection};
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Lifecycle status of a run.
///
/// ```text
/// planning ──▶ executing ⇄ reflecting
///    │              │           │
///    └──────────────┴───────────┴──▶ completed | failed | aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Planning,
    Executing,
    Reflecting,
    Completed,
    Failed,
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Planning => "planning",
            RunStatus::Executing => "executing",
            RunStatus::Reflecting => "reflecting",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Aborted
        )
    }

    /// Whether moving from `self` to `next` respects the lifecycle.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        use RunStatus::*;
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, to) if to.is_terminal() => true,
            (Planning, Planning | Executing) => true,
            (Executing | Reflecting, Executing | Reflecting) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error recorded against the run, optionally tied to a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepId>,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEntry {
    pub fn new(step: Option<StepId>, error: impl Into<String>) -> Self {
        Self {
            step,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Step progress through the current plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    /// Whole percent, 0-100
    pub percentage: u8,
}

impl Progress {
    pub fn new(current: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((current.min(total) * 100) / total) as u8
        };
        Self {
            current,
            total,
            percentage,
        }
    }
}

/// Result of dependency-aware step selection.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    /// All dependencies are satisfied.
    Ready(Step),
    /// Steps remain but none is ready; the first remaining one is returned anyway.
    Degraded(Step),
}

impl NextStep {
    pub fn into_step(self) -> Step {
        match self {
            NextStep::Ready(step) | NextStep::Degraded(step) => step,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, NextStep::Degraded(_))
    }
}

/// Read-only aggregate view of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub status: RunStatus,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    pub reflections: usize,
    pub findings: usize,
    pub findings_by_severity: BTreeMap<Severity, usize>,
    pub errors: usize,
    /// Milliseconds
    pub duration: u64,
}

/// Aggregate root of one task run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgenticContext {
    pub task: Task,
    pub plan: Plan,
    pub completed_steps: Vec<StepResult>,
    pub reflections: Vec<Reflection>,
    pub findings: Vec<Finding>,
    pub errors: Vec<ErrorEntry>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<Step>,
}

impl AgenticContext {
    pub fn new(task: Task) -> Self {
        Self {
            task,
            plan: Plan::default(),
            completed_steps: Vec::new(),
            reflections: Vec::new(),
            findings: Vec::new(),
            errors: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            status: RunStatus::Planning,
            current_step: None,
        }
    }

    pub fn completed_ids(&self) -> HashSet<&StepId> {
        self.completed_steps.iter().map(|r| &r.step_id).collect()
    }

    pub fn result_for(&self, id: &StepId) -> Option<&StepResult> {
        self.completed_steps.iter().find(|r| &r.step_id == id)
    }

    /// Plan steps without a recorded result, in plan order.
    pub fn remaining_steps(&self) -> impl Iterator<Item = &Step> {
        let completed = self.completed_ids();
        self.plan
            .steps
            .iter()
            .filter(move |s| !completed.contains(&s.id))
    }

    /// Record a step result, replacing an earlier attempt at the same step.
    ///
    /// Returns `true` when an earlier attempt was replaced.
    pub fn upsert_result(&mut self, result: StepResult) -> bool {
        match self
            .completed_steps
            .iter_mut()
            .find(|r| r.step_id == result.step_id)
        {
            Some(existing) => {
                *existing = result;
                true
            }
            None => {
                self.completed_steps.push(result);
                false
            }
        }
    }

    pub fn next_step(&self) -> Option<NextStep> {
        let completed = self.completed_ids();
        let mut remaining = self
            .plan
            .steps
            .iter()
            .filter(|s| !completed.contains(&s.id))
            .peekable();
        let first = (*remaining.peek()?).clone();
        Some(
            remaining
                .find(|s| s.dependencies_satisfied(&completed))
                .map(|s| NextStep::Ready(s.clone()))
                .unwrap_or(NextStep::Degraded(first)),
        )
    }

    /// Every remaining step that is ready and flagged parallel-safe.
    pub fn parallel_steps(&self) -> Vec<Step> {
        let completed = self.completed_ids();
        self.plan
            .steps
            .iter()
            .filter(|s| {
                s.can_run_in_parallel
                    && !completed.contains(&s.id)
                    && s.dependencies_satisfied(&completed)
            })
            .cloned()
            .collect()
    }

    /// Number of plan steps with a recorded result.
    fn completed_plan_steps(&self) -> usize {
        let completed = self.completed_ids();
        self.plan
            .steps
            .iter()
            .filter(|s| completed.contains(&s.id))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
            || (!self.plan.is_empty() && self.completed_plan_steps() == self.plan.len())
    }

    pub fn should_abort(&self) -> bool {
        self.status == RunStatus::Aborted
            || self
                .reflections
                .last()
                .is_some_and(|r| r.next_action == NextAction::Abort)
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.completed_plan_steps(), self.plan.len())
    }

    /// Elapsed run time, up to `end_time` once terminal.
    pub fn duration_ms(&self) -> u64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).num_milliseconds().max(0) as u64
    }

    pub fn findings_by_severity(&self) -> BTreeMap<Severity, Vec<&Finding>> {
        let mut grouped: BTreeMap<Severity, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            grouped.entry(finding.severity).or_default().push(finding);
        }
        grouped
    }

    pub fn summary(&self) -> RunSummary {
        let successful = self.completed_steps.iter().filter(|r| r.success).count();
        RunSummary {
            status: self.status,
            total_steps: self.plan.len(),
            completed_steps: self.completed_steps.len(),
            successful_steps: successful,
            failed_steps: self.completed_steps.len() - successful,
            reflections: self.reflections.len(),
            findings: self.findings.len(),
            findings_by_severity: self
                .findings_by_severity()
                .into_iter()
                .map(|(severity, findings)| (severity, findings.len()))
                .collect(),
            errors: self.errors.len(),
            duration: self.duration_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn result(id: &str, success: bool) -> StepResult {
        if success {
            StepResult::success(StepId::new(id), "t", json!("ok"), Duration::ZERO, 1)
        } else {
            StepResult::failure(
                StepId::new(id),
                "t",
                crate::execution::StepError::tool_failure("boom"),
                Duration::ZERO,
                1,
            )
        }
    }

    fn context_with_chain() -> AgenticContext {
        let mut ctx = AgenticContext::new(Task::new("scan example.com"));
        ctx.plan = Plan::new("chain")
            .with_step(Step::new("a", 1, "A", "recon_web"))
            .with_step(Step::new("b", 2, "B", "portscan").with_dependency("a").parallel())
            .with_step(Step::new("c", 3, "C", "webscan_quick").with_dependency("a").parallel());
        ctx
    }

    #[test]
    fn test_status_transitions() {
        use RunStatus::*;
        assert!(Planning.can_transition_to(Executing));
        assert!(Executing.can_transition_to(Reflecting));
        assert!(Reflecting.can_transition_to(Executing));
        assert!(Planning.can_transition_to(Failed));
        assert!(!Reflecting.can_transition_to(Planning));
        assert!(!Completed.can_transition_to(Executing));
        assert!(!Aborted.can_transition_to(Failed));
    }

    #[test]
    fn test_next_step_respects_dependencies() {
        let mut ctx = context_with_chain();
        assert_eq!(ctx.next_step(), Some(NextStep::Ready(ctx.plan.steps[0].clone())));
        ctx.upsert_result(result("a", true));
        let next = ctx.next_step().unwrap();
        assert!(!next.is_degraded());
        assert_eq!(next.into_step().id.as_str(), "b");
    }

    #[test]
    fn test_next_step_degrades_on_unmet_dependency() {
        let mut ctx = AgenticContext::new(Task::new("t"));
        ctx.plan = Plan::new("r").with_step(Step::new("x", 1, "X", "t").with_dependency("ghost"));
        let next = ctx.next_step().unwrap();
        assert!(next.is_degraded());
        assert_eq!(next.into_step().id.as_str(), "x");
    }

    #[test]
    fn test_next_step_none_when_all_done() {
        let mut ctx = context_with_chain();
        for id in ["a", "b", "c"] {
            ctx.upsert_result(result(id, true));
        }
        assert!(ctx.next_step().is_none());
        assert!(ctx.is_complete());
    }

    #[test]
    fn test_parallel_steps() {
        let mut ctx = context_with_chain();
        assert!(ctx.parallel_steps().is_empty());
        ctx.upsert_result(result("a", true));
        let ids: Vec<_> = ctx.parallel_steps().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![StepId::new("b"), StepId::new("c")]);
    }

    #[test]
    fn test_upsert_replaces_retry() {
        let mut ctx = context_with_chain();
        assert!(!ctx.upsert_result(result("a", false)));
        let mut retry = result("a", true);
        retry.attempt_number = 2;
        assert!(ctx.upsert_result(retry));
        assert_eq!(ctx.completed_steps.len(), 1);
        assert_eq!(ctx.completed_steps[0].attempt_number, 2);
    }

    #[test]
    fn test_failed_results_count_towards_progress() {
        let mut ctx = context_with_chain();
        ctx.upsert_result(result("a", false));
        let progress = ctx.progress();
        assert_eq!(progress.current, 1);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percentage, 33);
    }

    #[test]
    fn test_should_abort_from_reflection() {
        let mut ctx = context_with_chain();
        assert!(!ctx.should_abort());
        ctx.reflections.push(Reflection::new(false, NextAction::Abort));
        assert!(ctx.should_abort());
    }

    #[test]
    fn test_summary_and_grouping() {
        let mut ctx = context_with_chain();
        ctx.upsert_result(result("a", true));
        ctx.upsert_result(result("b", false));
        ctx.findings.push(Finding::new(Severity::High, "Weak TLS", ""));
        ctx.findings.push(Finding::new(Severity::High, "Open redirect", ""));
        ctx.findings.push(Finding::new(Severity::Low, "Banner", ""));

        let summary = ctx.summary();
        assert_eq!(summary.successful_steps, 1);
        assert_eq!(summary.failed_steps, 1);
        assert_eq!(summary.findings_by_severity[&Severity::High], 2);

        let grouped = ctx.findings_by_severity();
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![Severity::High, Severity::Low]);
    }

    #[test]
    fn test_empty_plan_is_not_complete() {
        let ctx = AgenticContext::new(Task::new("t"));
        assert!(!ctx.is_complete());
        assert_eq!(ctx.progress(), Progress::new(0, 0));
    }
}
