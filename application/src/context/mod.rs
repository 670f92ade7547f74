//! Context manager - sole owner and mutator of a run's [`AgenticContext`].
//!
//! [`AgenticContext`]: vigil_domain::AgenticContext

pub mod manager;

pub use manager::{ContextError, ContextManager};
