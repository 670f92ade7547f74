//! Execution records - step outcomes and security findings.

pub mod finding;
pub mod result;

pub use finding::{Finding, Severity, findings_from_output};
pub use result::{StepError, StepErrorKind, StepResult};
