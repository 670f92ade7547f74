//! Reflection phase: judge each step result and act on the decision.

use super::AgenticCore;
use super::types::{AgentError, Flow};
use crate::context::ContextManager;
use crate::ports::llm_gateway::LlmGateway;
use tracing::{debug, info, warn};
use vigil_domain::{AgentPromptTemplate, Message, NextAction, Reflection, Step, StepResult, parse_reflection};

impl<G: LlmGateway + 'static> AgenticCore<G> {
    async fn reflect(
        &self,
        manager: &ContextManager,
        step: &Step,
        result: &StepResult,
    ) -> Result<Reflection, AgentError> {
        let prompt = AgentPromptTemplate::reflection_request(
            manager.task(),
            step,
            result,
            manager.progress(),
        );
        let system = AgentPromptTemplate::reflection_system();
        let response = self
            .cancellable(self.gateway.complete(&[Message::user(prompt)], &system))
            .await??;

        parse_reflection(&response).map_err(|e| AgentError::ReflectionFailed(e.to_string()))
    }

    /// Reflect on `result` and carry out the chosen action.
    ///
    /// A retry loops back into reflection with the new result until the
    /// model moves on or attempts run out.
    pub(super) async fn reflect_and_act(
        &self,
        manager: &mut ContextManager,
        step: &Step,
        result: StepResult,
    ) -> Result<Flow, AgentError> {
        let mut result = result;

        loop {
            self.check_cancelled()?;
            let reflection = self.reflect(manager, step, &result).await?;
            let action = reflection.next_action;
            let task_complete = reflection.task_complete;
            debug!(
                step_id = %step.id,
                action = %action,
                confidence = reflection.confidence,
                "Reflection received"
            );
            manager.add_reflection(reflection.clone())?;

            if task_complete && action != NextAction::Abort {
                info!(step_id = %step.id, "Task reported complete");
                manager.complete()?;
                return Ok(Flow::Stop);
            }

            match action {
                NextAction::Continue => return Ok(Flow::Next),
                NextAction::Complete => {
                    manager.complete()?;
                    return Ok(Flow::Stop);
                }
                NextAction::Abort => {
                    let reason = if reflection.reasoning.is_empty() {
                        "Reflection requested abort".to_string()
                    } else {
                        format!("Reflection requested abort: {}", reflection.reasoning)
                    };
                    manager.abort(reason)?;
                    return Ok(Flow::Stop);
                }
                NextAction::Adjust => {
                    self.adjust_plan(manager, &reflection.adjustments)?;
                    return Ok(Flow::Next);
                }
                NextAction::Retry => match self.retry(manager, step, &result).await? {
                    Ok(next) => {
                        manager.add_step_result(next.clone())?;
                        result = next;
                    }
                    Err(e) => {
                        warn!(step_id = %step.id, "{}", e);
                        manager.record_error(Some(step.id.clone()), e.to_string())?;
                        return Ok(Flow::Next);
                    }
                },
            }
        }
    }
}
