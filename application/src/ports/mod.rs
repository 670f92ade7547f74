//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters and host
//! applications implement.

pub mod approval;
pub mod llm_gateway;
pub mod progress;
pub mod tool_handler;
