//! Safety validator - scores and gates tasks, plans, steps and targets.

use super::policy::{
    APPROVAL_RISK_FLOOR, DANGEROUS_KEYWORDS, KEYWORD_RISK, MAX_DESCRIPTION_LENGTH,
    SENSITIVE_TARGET_PATTERNS, SafetyPolicy,
};
use super::validation::ValidationResult;
use crate::core::risk::MAX_RISK_SCORE;
use crate::plan::{Plan, Step, StepId};
use crate::task::Task;
use crate::tool::ToolSpec;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Errors raised by the safety validator itself.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Circular dependency detected involving step {step_number} ({step_id})")]
    CircularDependency { step_number: u32, step_id: StepId },

    #[error("Invalid target pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Stateless-per-call policy engine.
///
/// Holds only the compiled policy and the tool catalogue; every check is a
/// pure function of its input.
#[derive(Debug, Clone)]
pub struct SafetyValidator {
    policy: SafetyPolicy,
    tools: ToolSpec,
    allowed_targets: Vec<Regex>,
    blocked_targets: Vec<Regex>,
    sensitive_targets: Vec<(Regex, &'static str)>,
}

fn compile(pattern: &str) -> Result<Regex, SafetyError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| SafetyError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

impl SafetyValidator {
    /// Compile the policy's target patterns against the given tool catalogue.
    pub fn new(policy: SafetyPolicy, tools: ToolSpec) -> Result<Self, SafetyError> {
        let allowed_targets = policy
            .allowed_targets
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        let blocked_targets = policy
            .blocked_targets
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        let sensitive_targets = SENSITIVE_TARGET_PATTERNS
            .iter()
            .map(|(pattern, label)| Ok((compile(pattern)?, *label)))
            .collect::<Result<Vec<_>, SafetyError>>()?;

        Ok(Self {
            policy,
            tools,
            allowed_targets,
            blocked_targets,
            sensitive_targets,
        })
    }

    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    fn threshold(&self) -> u8 {
        self.policy.require_approval_above_risk
    }

    /// Screen a task description and its constraints.
    pub fn validate_task(&self, task: &Task) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut risk: u32 = 0;

        let description = task.description.trim();
        if description.is_empty() {
            errors.push("Task description cannot be empty".to_string());
        } else if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.push(format!(
                "Task description exceeds {} characters",
                MAX_DESCRIPTION_LENGTH
            ));
        }

        let constraints = &task.constraints;
        if constraints.max_steps == 0 {
            errors.push("Task must allow at least one step".to_string());
        } else if constraints.max_steps > self.policy.max_steps {
            errors.push(format!(
                "Task step limit {} exceeds policy maximum of {}",
                constraints.max_steps, self.policy.max_steps
            ));
        }
        if constraints.max_duration == 0 {
            errors.push("Task must allow a non-zero duration".to_string());
        } else if constraints.max_duration > self.policy.max_duration_ms {
            errors.push(format!(
                "Task duration limit {}ms exceeds policy maximum of {}ms",
                constraints.max_duration, self.policy.max_duration_ms
            ));
        }

        let lowered = description.to_lowercase();
        for keyword in DANGEROUS_KEYWORDS {
            if lowered.contains(keyword) {
                risk += KEYWORD_RISK;
                warnings.push(format!(
                    "Task contains potentially dangerous keyword: '{}'",
                    keyword
                ));
            }
        }

        ValidationResult::evaluate(errors, warnings, risk, self.threshold())
    }

    /// Validate every step of a plan plus plan-level structure.
    pub fn validate_plan(&self, plan: &Plan) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if plan.is_empty() {
            errors.push("Plan has no steps".to_string());
        } else if plan.len() > self.policy.max_steps {
            errors.push(format!(
                "Plan has {} steps, exceeding the maximum of {}",
                plan.len(),
                self.policy.max_steps
            ));
        }

        if let Some(estimate) = plan.estimated_duration
            && estimate > self.policy.max_duration_ms
        {
            warnings.push(format!(
                "Plan estimate of {}ms exceeds the policy duration limit of {}ms",
                estimate, self.policy.max_duration_ms
            ));
        }

        let mut seen = HashSet::new();
        for step in &plan.steps {
            if !seen.insert(&step.id) {
                errors.push(format!("Duplicate step id: {}", step.id));
            }
        }

        let mut max_step_risk = 0;
        for step in &plan.steps {
            for dep in &step.dependencies {
                if !plan.contains(dep) {
                    warnings.push(format!(
                        "Step {}: depends on unknown step '{}'",
                        step.step_number, dep
                    ));
                }
            }

            let result = self.validate_step(step);
            max_step_risk = max_step_risk.max(result.risk_score);
            errors.extend(
                result
                    .errors
                    .into_iter()
                    .map(|e| format!("Step {}: {}", step.step_number, e)),
            );
            warnings.extend(
                result
                    .warnings
                    .into_iter()
                    .map(|w| format!("Step {}: {}", step.step_number, w)),
            );
        }

        if let Err(e) = self.check_circular_dependencies(plan) {
            errors.push(e.to_string());
        }

        let risk = max_step_risk.max(plan.risk_level.base_score());
        ValidationResult::evaluate(errors, warnings, risk as u32, self.threshold())
    }

    /// Validate one step against the tool catalogue and policy.
    pub fn validate_step(&self, step: &Step) -> ValidationResult {
        let Some(tool) = self.tools.get(&step.tool) else {
            return ValidationResult::evaluate(
                vec![format!("Unknown tool: {}", step.tool)],
                Vec::new(),
                MAX_RISK_SCORE as u32,
                self.threshold(),
            );
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.policy.is_tool_blocked(&step.tool) {
            errors.push(format!("Tool '{}' is blocked by policy", step.tool));
        }
        if !self.policy.is_tool_allowed(&step.tool) {
            errors.push(format!("Tool '{}' is not in the allowed tools list", step.tool));
        }

        for param in &tool.parameters {
            match step.parameters.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required && param.default.is_none() {
                        errors.push(format!("Missing required parameter: {}", param.name));
                    }
                }
                Some(value) => {
                    if !param.param_type.matches(value) {
                        errors.push(format!(
                            "Parameter '{}' must be of type {}",
                            param.name, param.param_type
                        ));
                    }
                }
            }
        }
        for name in step.parameters.keys() {
            if tool.parameter(name).is_none() {
                warnings.push(format!("Unknown parameter '{}' for tool '{}'", name, tool.name));
            }
        }

        let mut target_risk = 0;
        for target in step.targets() {
            let result = self.validate_target(target);
            target_risk = target_risk.max(result.risk_score);
            errors.extend(result.errors);
            warnings.extend(result.warnings);
        }

        let level = step.risk_level.max(tool.risk_level);
        let mut risk = level.base_score();
        if step.requires_approval || tool.requires_approval {
            risk = risk.max(APPROVAL_RISK_FLOOR);
        }
        risk = risk.max(target_risk);

        if level.is_high() && !self.policy.allow_high_risk_ops {
            errors.push(format!(
                "High-risk operation not allowed: step {} uses '{}'",
                step.step_number, step.tool
            ));
        }

        ValidationResult::evaluate(errors, warnings, risk as u32, self.threshold())
    }

    /// Check a single target against block/allow lists and sensitivity heuristics.
    pub fn validate_target(&self, target: &str) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut risk: u32 = 0;

        if let Some(pattern) = self.blocked_targets.iter().find(|re| re.is_match(target)) {
            errors.push(format!(
                "Target '{}' is blocked by policy (pattern '{}')",
                target,
                pattern.as_str()
            ));
            risk = MAX_RISK_SCORE as u32;
        } else if !self.allowed_targets.is_empty()
            && !self.allowed_targets.iter().any(|re| re.is_match(target))
        {
            errors.push(format!(
                "Target '{}' does not match any allowed target pattern",
                target
            ));
            risk = MAX_RISK_SCORE as u32;
        }

        if let Some((_, label)) = self
            .sensitive_targets
            .iter()
            .find(|(re, _)| re.is_match(target))
        {
            warnings.push(format!(
                "Target '{}' looks sensitive ({}); confirm authorization before scanning",
                target, label
            ));
        }

        ValidationResult::evaluate(errors, warnings, risk, self.threshold())
    }

    /// Breadth-first walk from each step through its dependencies.
    ///
    /// Reaching the originating step again is a cycle; the error names that
    /// step. Detection only, nothing is repaired.
    pub fn check_circular_dependencies(&self, plan: &Plan) -> Result<(), SafetyError> {
        for origin in &plan.steps {
            let mut queue: VecDeque<&StepId> = origin.dependencies.iter().collect();
            let mut visited: HashSet<&StepId> = HashSet::new();

            while let Some(id) = queue.pop_front() {
                if id == &origin.id {
                    return Err(SafetyError::CircularDependency {
                        step_number: origin.step_number,
                        step_id: origin.id.clone(),
                    });
                }
                if !visited.insert(id) {
                    continue;
                }
                if let Some(step) = plan.step(id) {
                    queue.extend(step.dependencies.iter());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::risk::RiskLevel;
    use crate::tool::{ParamType, ToolDefinition, ToolParameter};
    use serde_json::json;

    fn tools() -> ToolSpec {
        ToolSpec::new()
            .register(
                ToolDefinition::new("recon_web", "Web reconnaissance", RiskLevel::Low)
                    .with_parameter(ToolParameter::new("target", "Domain", true)),
            )
            .register(
                ToolDefinition::new("portscan", "Port scan", RiskLevel::Medium)
                    .with_parameter(ToolParameter::new("host", "Host", true))
                    .with_parameter(
                        ToolParameter::new("ports", "Ports", false).with_type(ParamType::Array),
                    )
                    .with_parameter(
                        ToolParameter::new("aggressive", "Aggressive timing", false)
                            .with_type(ParamType::Boolean),
                    ),
            )
            .register(
                ToolDefinition::new("exploit_check", "Exploit verification", RiskLevel::High)
                    .with_parameter(ToolParameter::new("target", "Target", true)),
            )
            .register(
                ToolDefinition::new("log_analyze", "Log analysis", RiskLevel::Low)
                    .requiring_approval()
                    .with_parameter(
                        ToolParameter::new("path", "Log path", false).with_default("/var/log/auth.log"),
                    ),
            )
    }

    fn validator(policy: SafetyPolicy) -> SafetyValidator {
        SafetyValidator::new(policy, tools()).unwrap()
    }

    fn recon(target: &str) -> Step {
        Step::new("step-1", 1, "Recon", "recon_web").with_param("target", target)
    }

    #[test]
    fn test_task_empty_description() {
        let result = validator(SafetyPolicy::default()).validate_task(&Task::new("   "));
        assert!(!result.valid);
        assert_eq!(result.errors, vec!["Task description cannot be empty"]);
    }

    #[test]
    fn test_task_keywords_add_risk() {
        let result = validator(SafetyPolicy::default())
            .validate_task(&Task::new("Check for ransomware and wipe evidence"));
        assert!(result.valid);
        assert_eq!(result.risk_score, 40);
        assert_eq!(result.warnings.len(), 2);
        assert!(!result.requires_approval);
    }

    #[test]
    fn test_task_keyword_risk_capped() {
        let description = DANGEROUS_KEYWORDS.join(" ");
        let result = validator(SafetyPolicy::default()).validate_task(&Task::new(description));
        assert_eq!(result.risk_score, 100);
        assert!(result.requires_approval);
    }

    #[test]
    fn test_task_constraint_ceilings() {
        let task = Task::new("scan example.com").with_max_steps(80);
        let result = validator(SafetyPolicy::default()).validate_task(&task);
        assert!(!result.valid);
        assert!(result.errors[0].contains("exceeds policy maximum"));
    }

    #[test]
    fn test_unknown_tool_scores_100() {
        let step = Step::new("s", 1, "?", "nmap_turbo");
        let result = validator(SafetyPolicy::default()).validate_step(&step);
        assert!(!result.valid);
        assert_eq!(result.risk_score, 100);
        assert!(result.requires_approval);
    }

    #[test]
    fn test_high_risk_step_rejected() {
        let step = Step::new("s", 1, "Exploit", "exploit_check")
            .with_param("target", "example.com")
            .with_risk_level(RiskLevel::High);
        let result = validator(SafetyPolicy::default()).validate_step(&step);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("High-risk operation not allowed")));

        let permissive = validator(SafetyPolicy::default().with_high_risk_ops(true));
        let result = permissive.validate_step(&step);
        assert!(result.valid);
        assert_eq!(result.risk_score, 80);
    }

    #[test]
    fn test_risk_never_below_step_level() {
        let v = validator(SafetyPolicy::default().with_high_risk_ops(true));
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            let step = recon("example.com").with_risk_level(level);
            assert!(v.validate_step(&step).risk_score >= level.base_score());
        }
    }

    #[test]
    fn test_approval_demand_raises_risk() {
        let step = Step::new("s", 1, "Logs", "log_analyze");
        let result = validator(SafetyPolicy::default()).validate_step(&step);
        assert_eq!(result.risk_score, 60);
        assert!(result.requires_approval);
        assert!(result.valid, "default covers the optional path parameter");
    }

    #[test]
    fn test_requires_approval_tracks_threshold() {
        for threshold in [0u8, 20, 50, 60, 81, 100] {
            let v = validator(SafetyPolicy::default().with_approval_threshold(threshold));
            for step in [
                recon("example.com"),
                Step::new("s", 1, "Logs", "log_analyze"),
                Step::new("s", 1, "?", "unknown"),
            ] {
                let result = v.validate_step(&step);
                assert_eq!(result.requires_approval, result.risk_score >= threshold);
            }
        }
    }

    #[test]
    fn test_parameter_schema() {
        let v = validator(SafetyPolicy::default());
        let missing = Step::new("s", 1, "Scan", "portscan");
        assert!(
            v.validate_step(&missing)
                .errors
                .contains(&"Missing required parameter: host".to_string())
        );

        let wrong_types = Step::new("s", 1, "Scan", "portscan")
            .with_param("host", "example.com")
            .with_param("ports", "80,443")
            .with_param("aggressive", "yes");
        let result = v.validate_step(&wrong_types);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("type array"));

        let good = Step::new("s", 1, "Scan", "portscan")
            .with_param("host", "example.com")
            .with_param("ports", json!([80, 443]))
            .with_param("verbose", true);
        let result = v.validate_step(&good);
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["Unknown parameter 'verbose' for tool 'portscan'"]);
    }

    #[test]
    fn test_tool_lists() {
        let v = validator(SafetyPolicy::default().with_blocked_tool("recon_web"));
        assert!(!v.validate_step(&recon("example.com")).valid);

        let v = validator(SafetyPolicy::default().with_allowed_tool("portscan"));
        let result = v.validate_step(&recon("example.com"));
        assert!(result.errors[0].contains("not in the allowed tools list"));
    }

    #[test]
    fn test_private_target_warns_only() {
        let result = validator(SafetyPolicy::default()).validate_target("10.0.0.5");
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("private network range"));
    }

    #[test]
    fn test_sensitive_domains_and_loopback() {
        let v = validator(SafetyPolicy::default());
        assert!(v.validate_target("https://portal.example.gov/login").has_warnings());
        assert!(v.validate_target("localhost:8080").has_warnings());
        assert!(v.validate_target("172.20.1.1").has_warnings());
        assert!(!v.validate_target("172.40.1.1").has_warnings());
        assert!(!v.validate_target("example.com").has_warnings());
    }

    #[test]
    fn test_block_list_beats_allow_list() {
        let policy = SafetyPolicy::default()
            .with_allowed_target(r"example\.com$")
            .with_blocked_target(r"^admin\.");
        let v = validator(policy);
        assert!(v.validate_target("www.example.com").valid);

        let blocked = v.validate_target("admin.example.com");
        assert!(!blocked.valid);
        assert!(blocked.errors[0].contains("blocked by policy"));
        assert_eq!(blocked.risk_score, 100);

        let outside = v.validate_target("other.org");
        assert!(outside.errors[0].contains("does not match any allowed"));
    }

    #[test]
    fn test_step_target_errors_propagate() {
        let v = validator(SafetyPolicy::default().with_blocked_target("example"));
        let result = v.validate_step(&recon("example.com"));
        assert!(!result.valid);
        assert_eq!(result.risk_score, 100);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = SafetyValidator::new(SafetyPolicy::default().with_blocked_target("(["), tools())
            .unwrap_err();
        assert!(matches!(err, SafetyError::InvalidPattern { .. }));
    }

    #[test]
    fn test_two_step_cycle_names_step() {
        let plan = Plan::new("cycle")
            .with_step(Step::new("step-1", 1, "A", "recon_web").with_dependency("step-2"))
            .with_step(Step::new("step-2", 2, "B", "recon_web").with_dependency("step-1"));

        let err = validator(SafetyPolicy::default())
            .check_circular_dependencies(&plan)
            .unwrap_err();
        match err {
            SafetyError::CircularDependency { step_number, .. } => {
                assert!(step_number == 1 || step_number == 2)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_acyclic_diamond_passes() {
        let plan = Plan::new("diamond")
            .with_step(Step::new("a", 1, "A", "recon_web"))
            .with_step(Step::new("b", 2, "B", "recon_web").with_dependency("a"))
            .with_step(Step::new("c", 3, "C", "recon_web").with_dependency("a"))
            .with_step(
                Step::new("d", 4, "D", "recon_web")
                    .with_dependency("b")
                    .with_dependency("c"),
            );
        assert!(
            validator(SafetyPolicy::default())
                .check_circular_dependencies(&plan)
                .is_ok()
        );
    }

    #[test]
    fn test_validate_plan_aggregates() {
        let plan = Plan::new("scan")
            .with_risk_level(RiskLevel::Medium)
            .with_step(recon("10.0.0.5"))
            .with_step(
                Step::new("step-2", 2, "Scan", "portscan")
                    .with_param("host", "example.com")
                    .with_dependency("step-9"),
            );
        let result = validator(SafetyPolicy::default()).validate_plan(&plan);
        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.risk_score, 50);
        assert!(result.warnings.iter().any(|w| w.starts_with("Step 1:")));
        assert!(result.warnings.iter().any(|w| w.contains("unknown step 'step-9'")));
    }

    #[test]
    fn test_validate_plan_rejections() {
        let v = validator(SafetyPolicy::default());
        assert_eq!(v.validate_plan(&Plan::new("empty")).errors, vec!["Plan has no steps"]);

        let dupes = Plan::new("d")
            .with_step(recon("example.com"))
            .with_step(recon("example.com"));
        assert!(
            v.validate_plan(&dupes)
                .errors
                .iter()
                .any(|e| e.contains("Duplicate step id"))
        );

        let cyclic = Plan::new("c").with_step(recon("example.com").with_dependency("step-1"));
        assert!(
            v.validate_plan(&cyclic)
                .errors
                .iter()
                .any(|e| e.contains("Circular dependency"))
        );
    }
}
