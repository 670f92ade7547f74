//! Tool registry - the merged catalogue of tool definitions and handlers.

pub mod registry;

pub use registry::{ToolOrigin, ToolRegistry, ToolRegistryBuilder};
