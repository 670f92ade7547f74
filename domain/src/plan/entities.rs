//! Plan and step entities.

use super::value_objects::StepId;
use crate::core::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Parameter names whose values are screened as scan targets.
pub const TARGET_PARAMETER_KEYS: [&str; 3] = ["target", "url", "host"];

/// One tool invocation within a plan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub id: StepId,
    #[serde(default)]
    pub step_number: u32,
    #[serde(default)]
    pub description: String,
    pub tool: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default)]
    pub can_run_in_parallel: bool,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u64>,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub requires_approval: bool,
}

impl Step {
    pub fn new(
        id: impl Into<StepId>,
        step_number: u32,
        description: impl Into<String>,
        tool: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            step_number,
            description: description.into(),
            tool: tool.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_dependency(mut self, id: impl Into<StepId>) -> Self {
        let id = id.into();
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self
    }

    pub fn with_success_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.success_criteria.push(criterion.into());
        self
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn with_estimated_duration(mut self, millis: u64) -> Self {
        self.estimated_duration = Some(millis);
        self
    }

    pub fn parallel(mut self) -> Self {
        self.can_run_in_parallel = true;
        self
    }

    pub fn requiring_approval(mut self) -> Self {
        self.requires_approval = true;
        self
    }

    /// String values of every target-like parameter.
    pub fn targets(&self) -> Vec<&str> {
        TARGET_PARAMETER_KEYS
            .iter()
            .filter_map(|key| self.parameters.get(*key).and_then(Value::as_str))
            .collect()
    }

    /// Whether every dependency appears in `completed`.
    pub fn dependencies_satisfied(&self, completed: &HashSet<&StepId>) -> bool {
        self.dependencies.iter().all(|dep| completed.contains(dep))
    }
}

/// An ordered set of steps satisfying a task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u64>,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl Plan {
    pub fn new(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &StepId) -> bool {
        self.step(id).is_some()
    }

    fn next_step_number(&self) -> u32 {
        self.steps.iter().map(|s| s.step_number).max().unwrap_or(0) + 1
    }

    /// Fill in missing step numbers and ids, and collapse duplicate dependencies.
    pub fn normalize(&mut self) {
        let mut seen_numbers = HashSet::new();
        for (index, step) in self.steps.iter_mut().enumerate() {
            if step.step_number == 0 || !seen_numbers.insert(step.step_number) {
                step.step_number = index as u32 + 1;
                seen_numbers.insert(step.step_number);
            }
            if step.id.is_empty() {
                step.id = StepId::numbered(step.step_number);
            }
            let mut unique = HashSet::new();
            step.dependencies.retain(|dep| unique.insert(dep.clone()));
        }
    }

    /// Append steps after the existing ones, numbering any that lack a number.
    pub fn append_steps(&mut self, steps: impl IntoIterator<Item = Step>) {
        for mut step in steps {
            if step.step_number == 0 || self.steps.iter().any(|s| s.step_number == step.step_number)
            {
                step.step_number = self.next_step_number();
            }
            if step.id.is_empty() || self.contains(&step.id) {
                step.id = StepId::numbered(step.step_number);
            }
            self.steps.push(step);
        }
    }

    /// Drop every step ordered before `step_number` that has not completed yet.
    ///
    /// Returns the ids that were removed. Steps that already completed stay
    /// so the completed-steps record keeps referring to plan members.
    pub fn skip_to(&mut self, step_number: u32, completed: &HashSet<&StepId>) -> Vec<StepId> {
        let mut removed = Vec::new();
        self.steps.retain(|step| {
            let keep = step.step_number >= step_number || completed.contains(&step.id);
            if !keep {
                removed.push(step.id.clone());
            }
            keep
        });
        removed
    }
}
