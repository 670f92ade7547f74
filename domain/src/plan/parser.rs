//! Plan parsing from model responses.
//!
//! Accepts a ` ```plan ` or ` ```json ` fenced block, a bare JSON response,
//! or JSON embedded in surrounding prose. Malformed output is an error;
//! an empty step list is not (the safety validator rejects it).

use super::entities::Plan;
use crate::core::error::DomainError;
use crate::core::string::extract_json_object;

/// Parse a [`Plan`] out of model response text.
///
/// Expected shape:
/// ```json
/// {
///   "reasoning": "string",
///   "riskLevel": "low|medium|high",
///   "estimatedDuration": 120000,
///   "steps": [
///     {
///       "id": "step-1",
///       "stepNumber": 1,
///       "description": "string",
///       "tool": "recon_web",
///       "parameters": { "target": "example.com" },
///       "successCriteria": ["..."],
///       "dependencies": [],
///       "canRunInParallel": false,
///       "riskLevel": "low"
///     }
///   ]
/// }
/// ```
pub fn parse_plan(response: &str) -> Result<Plan, DomainError> {
    let json = extract_json_object(response, &["plan"]).ok_or(DomainError::NoJsonFound)?;
    let mut plan: Plan =
        serde_json::from_str(json).map_err(|e| DomainError::InvalidPlan(e.to_string()))?;

    if let Some(step) = plan.steps.iter().find(|s| s.tool.trim().is_empty()) {
        return Err(DomainError::InvalidPlan(format!(
            "step '{}' does not name a tool",
            step.description
        )));
    }

    plan.normalize();
    Ok(plan)
}
