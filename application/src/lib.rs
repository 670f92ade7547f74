//! Application layer for vigil
//!
//! This crate contains the agent use cases, port definitions, the context
//! manager, the tool registry, and the provider fallback gateway.
//! It depends only on the domain layer.

pub mod config;
pub mod context;
pub mod llm;
pub mod ports;
pub mod tools;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use context::{ContextError, ContextManager};
pub use llm::FallbackGateway;
pub use ports::{
    approval::{ApprovalError, ApprovalPort, AutoApprove, AutoDeny},
    llm_gateway::{GatewayError, LlmBackend, LlmGateway},
    progress::{ChannelProgressListener, NoProgress, ProgressListener},
    tool_handler::{InvocationOptions, ToolHandler, ToolHandlerError},
};
pub use tools::{ToolOrigin, ToolRegistry, ToolRegistryBuilder};
pub use use_cases::execute_step::{ExecutionOptions, ExecutorError, ToolExecutor, retry_delay};
pub use use_cases::run_agent::{AgentError, AgentRunResult, AgenticCore};
