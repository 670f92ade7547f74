//! Tool handler port
//!
//! A [`ToolHandler`] is the implementation behind a tool definition. Concrete
//! scanners live outside the core; only the tool executor calls handlers.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use vigil_domain::StepId;

/// Error type returned by tool handlers.
///
/// Any error is normalized to its message by the executor.
pub type ToolHandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Per-invocation options passed to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOptions {
    pub step_id: StepId,
    /// Attempt number, starting at 1
    pub attempt: u32,
    /// How long the executor will wait for this call
    pub timeout: Duration,
}

/// Implementation of a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with defaults already applied to `parameters`.
    async fn invoke(
        &self,
        parameters: &Map<String, Value>,
        options: &InvocationOptions,
    ) -> Result<Value, ToolHandlerError>;
}
