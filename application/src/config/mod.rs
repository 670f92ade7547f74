//! Application-level configuration.
//!
//! - [`ExecutionParams`]: agent loop control (approval, retries, re-planning, timeouts)

pub mod execution_params;

pub use execution_params::ExecutionParams;
