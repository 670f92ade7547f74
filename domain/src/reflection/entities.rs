//! Reflection entities.

use crate::plan::Step;
use serde::{Deserialize, Serialize};

/// What the agent does after reflecting on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextAction {
    #[default]
    Continue,
    Retry,
    Adjust,
    Complete,
    Abort,
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::Continue => "continue",
            NextAction::Retry => "retry",
            NextAction::Adjust => "adjust",
            NextAction::Complete => "complete",
            NextAction::Abort => "abort",
        }
    }

    /// Whether the action ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NextAction::Complete | NextAction::Abort)
    }
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Plan changes requested by a reflection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanAdjustments {
    #[serde(default)]
    pub modify_plan: bool,
    #[serde(default)]
    pub retry_step: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_to_step: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_steps: Vec<Step>,
}

impl PlanAdjustments {
    /// Whether applying these adjustments would change the plan.
    pub fn changes_plan(&self) -> bool {
        self.skip_to_step.is_some() || !self.additional_steps.is_empty()
    }
}

/// The model's assessment of a step result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    #[serde(default)]
    pub reasoning: String,
    pub success: bool,
    #[serde(default)]
    pub success_criteria_met: Vec<bool>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default = "default_true")]
    pub should_continue: bool,
    #[serde(default)]
    pub task_complete: bool,
    pub next_action: NextAction,
    #[serde(default)]
    pub adjustments: PlanAdjustments,
}

fn default_true() -> bool {
    true
}

impl Reflection {
    pub fn new(success: bool, next_action: NextAction) -> Self {
        Self {
            reasoning: String::new(),
            success,
            success_criteria_met: Vec::new(),
            confidence: 1.0,
            should_continue: !next_action.is_terminal(),
            task_complete: next_action == NextAction::Complete,
            next_action,
            adjustments: PlanAdjustments::default(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_adjustments(mut self, adjustments: PlanAdjustments) -> Self {
        self.adjustments = adjustments;
        self
    }

    /// Force confidence into `[0, 1]`; NaN becomes 0.
    pub fn clamp_confidence(&mut self) {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
    }
}
