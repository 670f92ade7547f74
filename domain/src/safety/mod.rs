//! Safety domain - the pre-execution risk and policy gate.
//!
//! The [`SafetyValidator`] scores tasks, plans, steps and targets against a
//! [`SafetyPolicy`] and never executes anything. Every check returns a
//! [`ValidationResult`] whose `requires_approval` is derived from the risk
//! score and the policy threshold.

pub mod policy;
pub mod report;
pub mod validation;
pub mod validator;

pub use policy::SafetyPolicy;
pub use report::generate_report;
pub use validation::ValidationResult;
pub use validator::{SafetyError, SafetyValidator};
