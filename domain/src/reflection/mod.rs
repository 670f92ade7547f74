//! Reflection domain - post-step analysis that drives control flow.

pub mod entities;
pub mod parser;

pub use entities::{NextAction, PlanAdjustments, Reflection};
pub use parser::parse_reflection;
