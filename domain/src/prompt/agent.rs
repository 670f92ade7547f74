//! Prompt templates for the agentic loop

use crate::context::Progress;
use crate::core::string::truncate;
use crate::execution::StepResult;
use crate::plan::Step;
use crate::task::Task;
use crate::tool::ToolSpec;

/// Longest tool output quoted back to the model during reflection.
const MAX_OUTPUT_IN_PROMPT: usize = 4_000;

/// Templates for generating agent prompts
pub struct AgentPromptTemplate;

impl AgentPromptTemplate {
    fn tool_catalogue(tools: &ToolSpec) -> String {
        tools
            .all()
            .map(|t| {
                let params = t
                    .parameters
                    .iter()
                    .map(|p| {
                        let required = if p.required { " (required)" } else { "" };
                        let default = p
                            .default
                            .as_ref()
                            .map(|d| format!(" [default: {}]", d))
                            .unwrap_or_default();
                        format!(
                            "    - {} ({}){}{}: {}",
                            p.name, p.param_type, required, default, p.description
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                let approval = if t.requires_approval {
                    ", requires approval"
                } else {
                    ""
                };
                format!(
                    "- **{}**: {}\n  Risk: {}{}\n  Parameters:\n{}",
                    t.name, t.description, t.risk_level, approval, params
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// System prompt for plan generation.
    pub fn planning_system(tools: &ToolSpec) -> String {
        let tool_descriptions = Self::tool_catalogue(tools);

        format!(
            r#"You are the planning component of an autonomous security-operations agent.
You turn an authorized security task into a short, dependency-aware execution plan.

## Available Tools

{tool_descriptions}

## Rules

1. Use only the tools listed above, with the parameter names and types they declare.
2. Reference earlier steps in `dependencies` by their `id`; never create cycles.
3. Set `canRunInParallel` only for steps that do not depend on each other's results.
4. Prefer low-risk tools. Mark intrusive steps with the matching `riskLevel`.
5. Stay within the targets named in the task.

## Output Format

Respond with a single JSON object and nothing else:

```json
{{
  "reasoning": "why this plan satisfies the task",
  "estimatedDuration": 120000,
  "riskLevel": "low|medium|high",
  "steps": [
    {{
      "id": "step-1",
      "stepNumber": 1,
      "description": "what this step does",
      "tool": "tool_name",
      "parameters": {{ "target": "example.com" }},
      "successCriteria": ["observable outcome"],
      "dependencies": [],
      "canRunInParallel": false,
      "estimatedDuration": 30000,
      "riskLevel": "low",
      "requiresApproval": false
    }}
  ]
}}
```"#
        )
    }

    /// User prompt requesting a plan for `task`.
    pub fn planning_request(task: &Task) -> String {
        format!(
            r#"## Task

{description}

## Constraints

- At most {max_steps} steps
- At most {max_duration} seconds in total
- Execution mode: {mode}

Create the plan now."#,
            description = task.description,
            max_steps = task.constraints.max_steps,
            max_duration = task.constraints.max_duration / 1000,
            mode = task.mode,
        )
    }

    /// Follow-up prompt after a plan failed safety validation.
    pub fn replan_request(errors: &[String]) -> String {
        let issues = errors
            .iter()
            .map(|e| format!("- {}", e))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"The previous plan was rejected by the safety validator:

{issues}

Produce a corrected plan in the same JSON format that resolves every issue."#
        )
    }

    /// System prompt for reflection.
    pub fn reflection_system() -> String {
        r#"You are the reflection component of an autonomous security-operations agent.
After every step you judge the result against the step's success criteria and
decide what happens next.

## Actions

- `continue`: move on to the next step
- `retry`: the failure looks transient; run the same step again
- `adjust`: change the remaining plan (add steps or skip ahead)
- `complete`: the task is fully accomplished
- `abort`: continuing would be unsafe or pointless

## Output Format

Respond with a single JSON object and nothing else:

```json
{
  "reasoning": "assessment of the result",
  "success": true,
  "successCriteriaMet": [true],
  "confidence": 0.9,
  "shouldContinue": true,
  "taskComplete": false,
  "nextAction": "continue",
  "adjustments": {
    "modifyPlan": false,
    "retryStep": false,
    "skipToStep": null,
    "additionalSteps": []
  }
}
```

`additionalSteps` use the same step format as the plan."#
            .to_string()
    }

    /// User prompt asking for a reflection on `result`.
    pub fn reflection_request(
        task: &Task,
        step: &Step,
        result: &StepResult,
        progress: Progress,
    ) -> String {
        let criteria = if step.success_criteria.is_empty() {
            "- (none given)".to_string()
        } else {
            step.success_criteria
                .iter()
                .map(|c| format!("- {}", c))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let outcome = match (&result.error, result.success) {
            (Some(error), _) => format!("FAILED ({})", error),
            (None, true) => "SUCCEEDED".to_string(),
            (None, false) => "FAILED".to_string(),
        };

        format!(
            r#"## Task

{task}

## Step {number}: {description}

Tool: {tool} (attempt {attempt}, {duration}ms)
Outcome: {outcome}

### Success Criteria

{criteria}

### Output

{output}

## Progress

{current}/{total} steps recorded.

Reflect on this result."#,
            task = task.description,
            number = step.step_number,
            description = step.description,
            tool = result.tool_used,
            attempt = result.attempt_number,
            duration = result.duration,
            outcome = outcome,
            criteria = criteria,
            output = truncate(&result.output_text(), MAX_OUTPUT_IN_PROMPT),
            current = progress.current,
            total = progress.total,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk::RiskLevel;
    use crate::execution::StepError;
    use crate::plan::StepId;
    use crate::tool::{ToolDefinition, ToolParameter};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_planning_system_lists_tools() {
        let tools = ToolSpec::new().register(
            ToolDefinition::new("portscan", "TCP port scan", RiskLevel::Medium)
                .requiring_approval()
                .with_parameter(ToolParameter::new("host", "Host to scan", true))
                .with_parameter(ToolParameter::new("top_ports", "Port count", false).with_default(100)),
        );
        let prompt = AgentPromptTemplate::planning_system(&tools);
        assert!(prompt.contains("**portscan**"));
        assert!(prompt.contains("Risk: medium, requires approval"));
        assert!(prompt.contains("host (string) (required)"));
        assert!(prompt.contains("[default: 100]"));
    }

    #[test]
    fn test_planning_request_includes_constraints() {
        let prompt = AgentPromptTemplate::planning_request(&Task::new("scan example.com").with_max_steps(4));
        assert!(prompt.contains("scan example.com"));
        assert!(prompt.contains("At most 4 steps"));
        assert!(prompt.contains("sequential"));
    }

    #[test]
    fn test_replan_lists_errors() {
        let prompt = AgentPromptTemplate::replan_request(&["Step 1: Unknown tool: nmap".to_string()]);
        assert!(prompt.contains("- Step 1: Unknown tool: nmap"));
    }

    #[test]
    fn test_reflection_request_reports_failure() {
        let step = Step::new("step-1", 1, "Recon", "recon_web").with_success_criterion("hosts found");
        let result = StepResult::failure(
            StepId::new("step-1"),
            "recon_web",
            StepError::timeout(Duration::from_secs(5)),
            Duration::from_secs(5),
            2,
        );
        let prompt = AgentPromptTemplate::reflection_request(
            &Task::new("scan example.com"),
            &step,
            &result,
            Progress::new(1, 2),
        );
        assert!(prompt.contains("Outcome: FAILED (timeout:"));
        assert!(prompt.contains("attempt 2"));
        assert!(prompt.contains("- hosts found"));
    }

    #[test]
    fn test_reflection_request_truncates_output() {
        let step = Step::new("s", 1, "Dump", "log_analyze");
        let big = "x".repeat(10_000);
        let result = StepResult::success(StepId::new("s"), "log_analyze", json!(big), Duration::ZERO, 1);
        let prompt = AgentPromptTemplate::reflection_request(
            &Task::new("t"),
            &step,
            &result,
            Progress::new(1, 1),
        );
        assert!(prompt.len() < 6_000);
        assert!(prompt.contains("..."));
    }
}
