//! Domain layer for vigil
//!
//! This crate contains the core types and rules of the agent. It has no
//! dependencies on infrastructure or presentation concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! - **Task**: a natural-language request plus step and time budgets
//! - **Plan**: dependency-aware steps, each naming one tool
//! - **Reflection**: the model's verdict after every step
//!   (continue / retry / adjust / complete / abort)
//! - **AgenticContext**: the auditable record of a run
//! - **SafetyValidator**: risk scoring and policy gating before anything runs

pub mod context;
pub mod core;
pub mod execution;
pub mod plan;
pub mod prompt;
pub mod providers;
pub mod reflection;
pub mod safety;
pub mod session;
pub mod task;
pub mod tool;

// Re-export commonly used types
pub use context::{
    AgenticContext, ErrorEntry, NextStep, Progress, ProgressEvent, ProgressEventKind, RunStatus,
    RunSummary,
};
pub use core::{error::DomainError, risk::RiskLevel};
pub use execution::{Finding, Severity, StepError, StepErrorKind, StepResult, findings_from_output};
pub use plan::{Plan, Step, StepId, parse_plan};
pub use prompt::AgentPromptTemplate;
pub use providers::{
    ProviderConfig, ProviderErrorKind, ProviderKind, ProviderStatus, error_suggestion,
    next_available_provider,
};
pub use reflection::{NextAction, PlanAdjustments, Reflection, parse_reflection};
pub use safety::{SafetyError, SafetyPolicy, SafetyValidator, ValidationResult, generate_report};
pub use session::{Message, Role};
pub use task::{ExecutionMode, Task, TaskConstraints};
pub use tool::{ParamType, ToolDefinition, ToolParameter, ToolSpec};
