//! Run Agent use case
//!
//! Drives one task through the plan, validate, execute, reflect loop:
//!
//! | Phase              | Notes                                                  |
//! |--------------------|--------------------------------------------------------|
//! | 1. Task validation | Invalid tasks abort; risky tasks need approval         |
//! | 2. Planning        | Rejected plans are sent back with the validator errors |
//! | 3. Execution       | Sequential, or ready parallel-safe steps concurrently  |
//! |    - Step approval | Declined steps are recorded as `approval-denied`       |
//! | 4. Reflection      | continue / retry / adjust / complete / abort           |
//!
//! The loop ends when the plan is complete, a reflection ends it, the task's
//! step or time budget runs out, or the cancellation token fires.

mod planning;
mod reflection;
mod types;

pub use types::{AgentError, AgentRunResult};

use types::Flow;

use crate::config::ExecutionParams;
use crate::context::ContextManager;
use crate::ports::approval::{ApprovalError, ApprovalPort};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::ProgressListener;
use crate::tools::ToolRegistry;
use crate::use_cases::execute_step::{ExecutionOptions, ExecutorError, ToolExecutor};
use crate::use_cases::shared;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vigil_domain::core::string::truncate;
use vigil_domain::{SafetyValidator, Step, StepError, StepResult, Task, ValidationResult};

/// Orchestrator of agent runs.
///
/// One instance can run many tasks; each run gets its own context.
pub struct AgenticCore<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    tools: Arc<ToolRegistry>,
    executor: ToolExecutor,
    validator: SafetyValidator,
    params: ExecutionParams,
    approval: Option<Arc<dyn ApprovalPort>>,
    listeners: Vec<Arc<dyn ProgressListener>>,
    cancellation_token: Option<CancellationToken>,
}

impl<G: LlmGateway + 'static> AgenticCore<G> {
    pub fn new(gateway: Arc<G>, tools: Arc<ToolRegistry>, validator: SafetyValidator) -> Self {
        Self {
            gateway,
            executor: ToolExecutor::new(tools.clone()),
            tools,
            validator,
            params: ExecutionParams::default(),
            approval: None,
            listeners: Vec::new(),
            cancellation_token: None,
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    /// Set the approver consulted when auto-approval is off
    pub fn with_approval(mut self, approval: Arc<dyn ApprovalPort>) -> Self {
        self.approval = Some(approval);
        self
    }

    /// Attach a listener to every run's progress events
    pub fn with_listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    /// Run `task` to a terminal state.
    ///
    /// Never fails: every error ends the run as failed or aborted and is
    /// reported in the result.
    pub async fn run(&self, task: Task) -> AgentRunResult {
        let mut manager = ContextManager::new(task);
        for listener in &self.listeners {
            manager.add_listener(listener.clone());
        }

        info!(
            task = %truncate(&manager.task().description, 80),
            mode = %manager.task().mode,
            "Starting agent run"
        );

        if let Err(e) = self.drive(&mut manager).await {
            if manager.status().is_terminal() {
                warn!(error = %e, "Error after the run had ended");
            } else {
                let closed = if e.is_cancelled() {
                    manager.abort("cancelled")
                } else {
                    manager.fail(e.to_string())
                };
                if let Err(ce) = closed {
                    warn!(error = %ce, "Could not record terminal status");
                }
            }
        }

        let result = AgentRunResult::from_context(manager.into_context());
        info!(
            status = %result.status(),
            steps = result.context.completed_steps.len(),
            findings = result.context.findings.len(),
            "Agent run finished"
        );
        result
    }

    async fn drive(&self, manager: &mut ContextManager) -> Result<(), AgentError> {
        // The time budget covers approval and planning too
        let started = Instant::now();

        // Phase 1: Task validation
        let validation = self.validator.validate_task(manager.task());
        for warning in &validation.warnings {
            warn!("Task warning: {}", warning);
        }
        if !validation.valid {
            manager.abort(format!(
                "Task rejected by safety validation: {}",
                validation.errors.join("; ")
            ))?;
            return Ok(());
        }
        if validation.requires_approval && !self.approve_task(manager.task(), &validation).await? {
            manager.abort("Task approval denied")?;
            return Ok(());
        }

        // Phase 2: Planning
        self.check_cancelled()?;
        let plan = self.create_plan(manager).await?;
        manager.update_plan(plan)?;

        // Phase 3-4: Execute and reflect
        let constraints = manager.task().constraints;
        let mut executed = 0usize;

        loop {
            self.check_cancelled()?;
            if manager.status().is_terminal() {
                return Ok(());
            }
            if manager.is_complete() {
                manager.complete()?;
                return Ok(());
            }
            if manager.should_abort() {
                manager.abort("Run marked for abort")?;
                return Ok(());
            }
            if executed >= constraints.max_steps {
                manager.fail(format!(
                    "Step budget exhausted: {} of {} steps executed",
                    executed, constraints.max_steps
                ))?;
                return Ok(());
            }
            let elapsed = started.elapsed();
            if elapsed >= constraints.max_duration() {
                manager.fail(format!(
                    "Time budget exhausted after {}ms (limit {}ms)",
                    elapsed.as_millis(),
                    constraints.max_duration
                ))?;
                return Ok(());
            }

            let mut batch = self.select_steps(manager);
            if batch.is_empty() {
                manager.complete()?;
                return Ok(());
            }
            batch.truncate(constraints.max_steps - executed);
            executed += batch.len();

            let results = self.execute_batch(manager, &batch).await?;
            for (step, result) in batch.iter().zip(results) {
                if self.reflect_and_act(manager, step, result).await? == Flow::Stop {
                    return Ok(());
                }
            }
        }
    }

    /// Ready parallel-safe steps in parallel mode, otherwise the next step.
    fn select_steps(&self, manager: &ContextManager) -> Vec<Step> {
        if manager.task().mode.is_parallel() {
            let ready = manager.parallel_steps();
            if !ready.is_empty() {
                return ready;
            }
        }
        manager.next_step().into_iter().collect()
    }

    /// Gate each step on approval, run the approved ones, and record every
    /// result in batch order.
    async fn execute_batch(
        &self,
        manager: &mut ContextManager,
        batch: &[Step],
    ) -> Result<Vec<StepResult>, AgentError> {
        let mut slots: Vec<Option<StepResult>> = vec![None; batch.len()];
        let mut approved = Vec::new();

        for (index, step) in batch.iter().enumerate() {
            manager.set_current_step(step.clone())?;
            if self.approve_step(step).await? {
                approved.push(index);
            } else {
                info!(step_id = %step.id, "Step approval denied");
                slots[index] = Some(Self::denied(step, 1));
            }
        }

        let to_run: Vec<Step> = approved.iter().map(|&i| batch[i].clone()).collect();
        let options = self.execution_options();
        let outputs = self
            .cancellable(self.executor.execute_parallel(&to_run, &options))
            .await?;
        for (index, result) in approved.into_iter().zip(outputs) {
            slots[index] = Some(result);
        }

        let results: Vec<StepResult> = slots.into_iter().flatten().collect();
        for result in &results {
            manager.add_step_result(result.clone())?;
        }
        Ok(results)
    }

    /// Run the attempt after `previous`, gated on approval like the first
    /// one. A denial is recorded as another `approval-denied` attempt.
    async fn retry(
        &self,
        manager: &mut ContextManager,
        step: &Step,
        previous: &StepResult,
    ) -> Result<Result<StepResult, ExecutorError>, AgentError> {
        let max_attempts = self.params.max_retries;
        if previous.attempt_number >= max_attempts {
            return Ok(Err(ExecutorError::RetryExhausted {
                step_id: step.id.clone(),
                previous_attempt: previous.attempt_number,
                max_attempts,
            }));
        }

        manager.set_current_step(step.clone())?;
        if !self.approve_step(step).await? {
            info!(step_id = %step.id, "Retry approval denied");
            return Ok(Ok(Self::denied(step, previous.attempt_number + 1)));
        }

        let options = self.execution_options();
        let retried = self
            .executor
            .retry_step(step, previous.attempt_number, max_attempts, &options);
        self.cancellable(retried).await
    }

    fn denied(step: &Step, attempt: u32) -> StepResult {
        StepResult::failure(
            step.id.clone(),
            &step.tool,
            StepError::approval_denied(format!(
                "Approval denied for step {} ({})",
                step.step_number, step.tool
            )),
            Duration::ZERO,
            attempt,
        )
    }

    async fn approve_task(
        &self,
        task: &Task,
        validation: &ValidationResult,
    ) -> Result<bool, AgentError> {
        if self.params.auto_approve {
            info!(risk_score = validation.risk_score, "Task auto-approved");
            return Ok(true);
        }
        let Some(approval) = &self.approval else {
            warn!("Task requires approval but no approver is configured");
            return Ok(false);
        };
        let decision = self
            .cancellable(approval.approve_task(task, validation))
            .await?;
        Self::settle_decision(decision)
    }

    async fn approve_step(&self, step: &Step) -> Result<bool, AgentError> {
        let validation = self.validator.validate_step(step);
        if !step.requires_approval && !validation.requires_approval {
            return Ok(true);
        }
        if self.params.auto_approve {
            info!(step_id = %step.id, risk_score = validation.risk_score, "Step auto-approved");
            return Ok(true);
        }
        let Some(approval) = &self.approval else {
            warn!(step_id = %step.id, "Step requires approval but no approver is configured");
            return Ok(false);
        };
        let decision = self
            .cancellable(approval.approve_step(step, &validation))
            .await?;
        Self::settle_decision(decision)
    }

    fn settle_decision(decision: Result<bool, ApprovalError>) -> Result<bool, AgentError> {
        match decision {
            Ok(approved) => Ok(approved),
            Err(ApprovalError::Cancelled) => Err(AgentError::Cancelled),
            Err(e) => {
                warn!(error = %e, "Approval failed, treating as denied");
                Ok(false)
            }
        }
    }

    fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            timeout: self.params.step_timeout,
        }
    }

    fn check_cancelled(&self) -> Result<(), AgentError> {
        shared::check_cancelled(&self.cancellation_token)
    }

    async fn cancellable<T>(&self, future: impl Future<Output = T>) -> Result<T, AgentError> {
        shared::cancellable(&self.cancellation_token, future).await
    }
}
