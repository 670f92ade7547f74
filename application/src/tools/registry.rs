//! Tool Registry
//!
//! The [`ToolRegistry`] merges built-in and external tools into a single
//! catalogue mapping each name to its [`ToolDefinition`] and, when one is
//! registered, its [`ToolHandler`].
//!
//! # Lifecycle
//!
//! A registry is assembled once with [`ToolRegistryBuilder`] and is
//! read-only afterwards, so it can be shared behind an `Arc` by any number
//! of concurrent runs.
//!
//! ```ignore
//! let registry = ToolRegistry::builder()
//!     .builtin(recon_web_definition(), None)
//!     .external(custom_definition, Arc::new(CommandTool::new(...)))
//!     .build();
//!
//! assert!(registry.is_tool_available("recon_web"));
//! ```
//!
//! # Conflict Resolution
//!
//! External tools win over built-ins of the same name: an external handler
//! is how a deployment supplies the implementation for a built-in scanner.

use crate::ports::tool_handler::ToolHandler;
use std::collections::HashMap;
use std::sync::Arc;
use vigil_domain::{ToolDefinition, ToolSpec};

/// Where a tool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOrigin {
    Builtin,
    External,
}

impl ToolOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOrigin::Builtin => "builtin",
            ToolOrigin::External => "external",
        }
    }
}

/// Builder collecting tools before the registry is frozen.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    builtin: Vec<(ToolDefinition, Option<Arc<dyn ToolHandler>>)>,
    external: Vec<(ToolDefinition, Arc<dyn ToolHandler>)>,
}

impl ToolRegistryBuilder {
    /// Register a built-in tool, with or without an implementation.
    pub fn builtin(mut self, definition: ToolDefinition, handler: Option<Arc<dyn ToolHandler>>) -> Self {
        self.builtin.push((definition, handler));
        self
    }

    /// Register an externally supplied tool.
    pub fn external(mut self, definition: ToolDefinition, handler: Arc<dyn ToolHandler>) -> Self {
        self.external.push((definition, handler));
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> ToolRegistry {
        let mut spec = ToolSpec::new();
        let mut handlers = HashMap::new();
        let mut origins = HashMap::new();

        for (definition, handler) in self.builtin {
            let name = definition.name.clone();
            spec.insert(definition);
            origins.insert(name.clone(), ToolOrigin::Builtin);
            match handler {
                Some(handler) => {
                    handlers.insert(name, handler);
                }
                None => {
                    handlers.remove(&name);
                }
            }
        }

        for (definition, handler) in self.external {
            let name = definition.name.clone();
            if spec.insert(definition).is_some() {
                tracing::debug!(tool = %name, "External tool overrides built-in definition");
            }
            origins.insert(name.clone(), ToolOrigin::External);
            handlers.insert(name, handler);
        }

        tracing::debug!(
            tools = spec.len(),
            executable = handlers.len(),
            "Tool registry initialized"
        );

        ToolRegistry {
            spec,
            handlers,
            origins,
        }
    }
}

/// Read-only merged tool registry.
pub struct ToolRegistry {
    spec: ToolSpec,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    origins: HashMap<String, ToolOrigin>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Catalogue of every declared tool.
    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.spec.get(name)
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn origin(&self, name: &str) -> Option<ToolOrigin> {
        self.origins.get(name).copied()
    }

    /// Declared and backed by a handler.
    pub fn is_tool_available(&self, name: &str) -> bool {
        self.spec.contains(name) && self.handlers.contains_key(name)
    }

    /// Names of every tool that can actually run, in name order.
    pub fn available_tools(&self) -> Vec<&str> {
        self.spec
            .names()
            .filter(|name| self.handlers.contains_key(*name))
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.spec.names().collect::<Vec<_>>())
            .field("executable", &self.available_tools())
            .finish()
    }
}
