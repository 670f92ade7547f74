//! Plan domain - dependency-aware execution plans produced by the model.
//!
//! - [`entities::Plan`] / [`entities::Step`]: the plan aggregate and its steps
//! - [`value_objects::StepId`]: step identifier
//! - [`parser`]: extracting a plan from model output

pub mod entities;
pub mod parser;
pub mod value_objects;

pub use entities::{Plan, Step, TARGET_PARAMETER_KEYS};
pub use parser::parse_plan;
pub use value_objects::StepId;
