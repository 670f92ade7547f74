//! Context Manager
//!
//! Owns one [`AgenticContext`] per run. Every mutation goes through this type,
//! which enforces the status lifecycle and notifies progress listeners.
//!
//! # Event Emission
//!
//! Listeners are called synchronously in registration order. A panicking
//! listener is caught and logged; it affects neither the run nor the
//! listeners after it.

use crate::ports::progress::ProgressListener;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use vigil_domain::{
    AgenticContext, ErrorEntry, Finding, NextStep, Plan, Progress, ProgressEvent,
    ProgressEventKind, Reflection, RunStatus, RunSummary, Severity, Step, StepId, StepResult, Task,
    findings_from_output,
};

/// Errors raised by the context manager.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Run is already {0}; no further changes are allowed")]
    Terminal(RunStatus),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },

    #[error("Step {0} is not part of the current plan")]
    UnknownStep(StepId),

    #[error("Failed to export context: {0}")]
    Export(#[source] serde_json::Error),

    #[error("Failed to import context: {0}")]
    Import(#[source] serde_json::Error),
}

/// Sole mutator of a run's context.
pub struct ContextManager {
    context: AgenticContext,
    listeners: Vec<Arc<dyn ProgressListener>>,
}

impl ContextManager {
    pub fn new(task: Task) -> Self {
        Self {
            context: AgenticContext::new(task),
            listeners: Vec::new(),
        }
    }

    /// Register a progress listener.
    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ProgressListener>) {
        self.listeners.push(listener);
    }

    // ==================== Read-only views ====================

    pub fn context(&self) -> &AgenticContext {
        &self.context
    }

    pub fn into_context(self) -> AgenticContext {
        self.context
    }

    pub fn task(&self) -> &Task {
        &self.context.task
    }

    pub fn plan(&self) -> &Plan {
        &self.context.plan
    }

    pub fn status(&self) -> RunStatus {
        self.context.status
    }

    /// First remaining step whose dependencies are satisfied.
    ///
    /// When steps remain but none is ready, the first remaining step is
    /// returned anyway and a warning is logged.
    pub fn next_step(&self) -> Option<Step> {
        let next = self.context.next_step()?;
        if let NextStep::Degraded(step) = &next {
            warn!(
                step_id = %step.id,
                dependencies = ?step.dependencies,
                "No step has its dependencies satisfied; continuing with the first remaining step"
            );
        }
        Some(next.into_step())
    }

    /// Every ready step flagged to run in parallel.
    pub fn parallel_steps(&self) -> Vec<Step> {
        self.context.parallel_steps()
    }

    pub fn is_complete(&self) -> bool {
        self.context.is_complete()
    }

    pub fn should_abort(&self) -> bool {
        self.context.should_abort()
    }

    pub fn progress(&self) -> Progress {
        self.context.progress()
    }

    pub fn summary(&self) -> RunSummary {
        self.context.summary()
    }

    pub fn findings_by_severity(&self) -> BTreeMap<Severity, Vec<&Finding>> {
        self.context.findings_by_severity()
    }

    // ==================== Mutations ====================

    fn ensure_mutable(&self) -> Result<(), ContextError> {
        if self.context.status.is_terminal() {
            return Err(ContextError::Terminal(self.context.status));
        }
        Ok(())
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), ContextError> {
        self.ensure_mutable()?;
        let current = self.context.status;
        if current != next && !current.can_transition_to(next) {
            return Err(ContextError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.context.status = next;
        Ok(())
    }

    /// Replace the plan. Validation is the caller's job.
    pub fn update_plan(&mut self, plan: Plan) -> Result<(), ContextError> {
        self.ensure_mutable()?;
        self.context.plan = plan;
        let message = format!("Plan ready with {} steps", self.context.plan.len());
        self.emit(ProgressEvent::new(ProgressEventKind::Plan, message, self.progress()));
        Ok(())
    }

    pub fn set_current_step(&mut self, step: Step) -> Result<(), ContextError> {
        self.transition(RunStatus::Executing)?;
        let message = format!("Step {}: {}", step.step_number, step.description);
        self.context.current_step = Some(step.clone());
        self.emit(
            ProgressEvent::new(ProgressEventKind::StepStart, message, self.progress())
                .with_step(step),
        );
        Ok(())
    }

    /// Record a step result; a retry replaces the earlier attempt.
    ///
    /// Failed results are also recorded in the error list. Findings reported
    /// in a successful result's output are added after the result itself.
    pub fn add_step_result(&mut self, result: StepResult) -> Result<(), ContextError> {
        self.ensure_mutable()?;
        if !self.context.plan.contains(&result.step_id) {
            return Err(ContextError::UnknownStep(result.step_id));
        }

        if !result.success {
            let error = result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "step failed without an error message".to_string());
            self.context
                .errors
                .push(ErrorEntry::new(Some(result.step_id.clone()), error));
        }

        if self.context.upsert_result(result.clone()) {
            debug!(step_id = %result.step_id, attempt = result.attempt_number, "Replaced earlier attempt");
        }

        let findings = match (&result.output, result.success) {
            (Some(output), true) => {
                let findings = findings_from_output(output);
                let reported = output
                    .get("findings")
                    .and_then(|f| f.as_array())
                    .map_or(0, Vec::len);
                if reported > findings.len() {
                    debug!(
                        step_id = %result.step_id,
                        skipped = reported - findings.len(),
                        "Skipped malformed finding entries"
                    );
                }
                findings
            }
            _ => Vec::new(),
        };

        let message = format!(
            "Step {} {} (attempt {}, {}ms)",
            result.step_id,
            if result.success { "succeeded" } else { "failed" },
            result.attempt_number,
            result.duration
        );
        self.emit(
            ProgressEvent::new(ProgressEventKind::StepComplete, message, self.progress())
                .with_result(result),
        );
        self.add_findings(findings)
    }

    pub fn add_reflection(&mut self, reflection: Reflection) -> Result<(), ContextError> {
        self.transition(RunStatus::Reflecting)?;
        self.context.reflections.push(reflection.clone());
        let message = format!(
            "Reflection: {} (confidence {:.2})",
            reflection.next_action, reflection.confidence
        );
        self.emit(
            ProgressEvent::new(ProgressEventKind::Reflection, message, self.progress())
                .with_reflection(reflection),
        );
        Ok(())
    }

    /// Append a finding. Findings are never deduplicated or removed.
    pub fn add_finding(&mut self, finding: Finding) -> Result<(), ContextError> {
        self.ensure_mutable()?;
        self.context.findings.push(finding.clone());
        let message = format!("[{}] {}", finding.severity, finding.title);
        self.emit(
            ProgressEvent::new(ProgressEventKind::Finding, message, self.progress())
                .with_finding(finding),
        );
        Ok(())
    }

    pub fn add_findings(
        &mut self,
        findings: impl IntoIterator<Item = Finding>,
    ) -> Result<(), ContextError> {
        for finding in findings {
            self.add_finding(finding)?;
        }
        Ok(())
    }

    /// Record an error not tied to a step result.
    pub fn record_error(
        &mut self,
        step: Option<StepId>,
        error: impl Into<String>,
    ) -> Result<(), ContextError> {
        self.ensure_mutable()?;
        self.context.errors.push(ErrorEntry::new(step, error));
        Ok(())
    }

    fn finish(
        &mut self,
        status: RunStatus,
        kind: ProgressEventKind,
        reason: Option<String>,
    ) -> Result<(), ContextError> {
        self.transition(status)?;
        self.context.end_time = Some(chrono::Utc::now());
        self.context.current_step = None;
        if let Some(reason) = &reason {
            self.context.errors.push(ErrorEntry::new(None, reason.clone()));
        }

        let duration = self.context.duration_ms();
        let message = match reason {
            Some(reason) => format!("Run {} after {}ms: {}", status, duration, reason),
            None => format!("Run {} after {}ms", status, duration),
        };
        self.emit(ProgressEvent::new(kind, message, self.progress()).with_duration(duration));
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), ContextError> {
        self.finish(RunStatus::Completed, ProgressEventKind::Completed, None)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), ContextError> {
        self.finish(
            RunStatus::Failed,
            ProgressEventKind::Failed,
            Some(reason.into()),
        )
    }

    pub fn abort(&mut self, reason: impl Into<String>) -> Result<(), ContextError> {
        self.finish(
            RunStatus::Aborted,
            ProgressEventKind::Aborted,
            Some(reason.into()),
        )
    }

    // ==================== Persistence ====================

    /// Serialize the full context as JSON.
    pub fn export(&self) -> Result<String, ContextError> {
        serde_json::to_string_pretty(&self.context).map_err(ContextError::Export)
    }

    /// Restore a context previously produced by [`export`](Self::export).
    ///
    /// Listeners are not part of the snapshot.
    pub fn import(json: &str) -> Result<Self, ContextError> {
        let context = serde_json::from_str(json).map_err(ContextError::Import)?;
        Ok(Self {
            context,
            listeners: Vec::new(),
        })
    }

    fn emit(&self, event: ProgressEvent) {
        for (index, listener) in self.listeners.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| listener.on_event(&event))).is_err() {
                warn!(listener = index, event = %event.kind, "Progress listener panicked");
            }
        }
    }
}
