//! Tool domain module
//!
//! Tools are the agent's only way of acting on the world: every plan step
//! names one. This module holds the declarative side of the tool system.
//!
//! ```text
//! ┌──────────────┐    ┌────────────────┐
//! │ ToolSpec     │───▶│ ToolDefinition │── parameters: [ToolParameter]
//! │ (catalogue)  │    │ risk_level     │
//! └──────────────┘    │ requires_approval
//!                     └────────────────┘
//! ```
//!
//! Implementations live behind the application layer's `ToolHandler` port;
//! the domain only knows what a tool accepts and how risky it is.
//!
//! # Key Types
//!
//! - [`ToolSpec`]: catalogue of tool definitions, ordered by name
//! - [`ToolDefinition`]: schema for a single tool (name, params, risk level)
//! - [`ToolParameter`] / [`ParamType`]: declared parameter schema

pub mod entities;

pub use entities::{ParamType, ToolDefinition, ToolParameter, ToolSpec};
