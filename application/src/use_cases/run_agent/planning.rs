//! Planning and plan adjustment for the agent run.

use super::AgenticCore;
use super::types::AgentError;
use crate::context::ContextManager;
use crate::ports::llm_gateway::LlmGateway;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use vigil_domain::{AgentPromptTemplate, Message, Plan, PlanAdjustments, StepId, parse_plan};

impl<G: LlmGateway + 'static> AgenticCore<G> {
    /// Ask the model for a plan until one passes safety validation.
    ///
    /// Each rejected plan is fed back with the validator's errors, up to
    /// `max_plan_attempts` plans in total.
    pub(super) async fn create_plan(&self, manager: &ContextManager) -> Result<Plan, AgentError> {
        let system = AgentPromptTemplate::planning_system(self.tools.spec());
        let mut history = vec![Message::user(AgentPromptTemplate::planning_request(
            manager.task(),
        ))];
        let max_attempts = self.params.max_plan_attempts;
        let mut last_errors = Vec::new();

        for attempt in 1..=max_attempts {
            let response = self
                .cancellable(self.gateway.complete(&history, &system))
                .await??;

            let plan =
                parse_plan(&response).map_err(|e| AgentError::PlanningFailed(e.to_string()))?;
            let validation = self.validator.validate_plan(&plan);

            for warning in &validation.warnings {
                debug!(attempt, "Plan warning: {}", warning);
            }

            if validation.valid {
                info!(
                    attempt,
                    steps = plan.len(),
                    risk_score = validation.risk_score,
                    "Plan accepted"
                );
                return Ok(plan);
            }

            warn!(attempt, errors = ?validation.errors, "Plan failed safety validation");
            history.push(Message::assistant(response));
            history.push(Message::user(AgentPromptTemplate::replan_request(
                &validation.errors,
            )));
            last_errors = validation.errors;
        }

        Err(AgentError::PlanRejected {
            attempts: max_attempts,
            errors: last_errors.join("; "),
        })
    }

    /// Apply a reflection's plan adjustments.
    ///
    /// The adjusted plan must pass validation; otherwise the current plan is
    /// kept and the rejection is recorded as an error.
    pub(super) fn adjust_plan(
        &self,
        manager: &mut ContextManager,
        adjustments: &PlanAdjustments,
    ) -> Result<(), AgentError> {
        if !adjustments.changes_plan() {
            debug!("Adjust requested without plan changes");
            return Ok(());
        }

        let mut plan = manager.plan().clone();
        {
            let completed: HashSet<&StepId> = manager.context().completed_ids();
            if let Some(step_number) = adjustments.skip_to_step {
                let skipped = plan.skip_to(step_number, &completed);
                info!(step_number, skipped = ?skipped, "Skipping ahead in plan");
            }
        }
        if !adjustments.additional_steps.is_empty() {
            info!(added = adjustments.additional_steps.len(), "Adding steps to plan");
            plan.append_steps(adjustments.additional_steps.iter().cloned());
        }

        let validation = self.validator.validate_plan(&plan);
        if !validation.valid {
            warn!(errors = ?validation.errors, "Adjusted plan rejected, keeping current plan");
            manager.record_error(
                None,
                format!(
                    "Plan adjustment rejected: {}",
                    validation.errors.join("; ")
                ),
            )?;
            return Ok(());
        }

        manager.update_plan(plan)?;
        Ok(())
    }
}
