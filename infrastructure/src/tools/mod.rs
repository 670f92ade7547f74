//! Tool adapters
//!
//! - [`builtin`]: declarations of the standard scanner family
//! - [`command`]: external tools backed by shell command templates
//!
//! [`build_registry`] merges both into the application's tool registry.

pub mod builtin;
pub mod command;

pub use builtin::builtin_definitions;
pub use command::{CommandTool, CommandToolError};

use crate::config::{ConfigError, FileToolsConfig};
use std::sync::Arc;
use tracing::debug;
use vigil_application::ToolRegistry;

/// Registry of the built-in catalogue plus configured command tools.
pub fn build_registry(config: &FileToolsConfig) -> Result<ToolRegistry, ConfigError> {
    let mut builder = ToolRegistry::builder();
    for definition in builtin_definitions() {
        builder = builder.builtin(definition, None);
    }

    for (name, custom) in &config.custom {
        let definition = custom.to_definition(name)?;
        let tool = CommandTool::new(name, &custom.command).map_err(|e| ConfigError::InvalidTool {
            name: name.clone(),
            detail: e.to_string(),
        })?;
        debug!(tool = %name, command = %custom.command, "Registering command tool");
        builder = builder.external(definition, Arc::new(tool));
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileCustomToolConfig;
    use std::collections::BTreeMap;
    use vigil_application::ToolOrigin;

    fn custom(command: &str) -> FileCustomToolConfig {
        FileCustomToolConfig {
            description: String::new(),
            command: command.to_string(),
            risk_level: "medium".to_string(),
            requires_approval: false,
            parameters: BTreeMap::new(),
        }
    }

    #[test]
    fn test_builtins_declared_without_handlers() {
        let registry = build_registry(&FileToolsConfig::default()).unwrap();
        assert_eq!(registry.spec().len(), 6);
        assert!(registry.definition("recon_web").is_some());
        assert!(!registry.is_tool_available("recon_web"));
        assert!(registry.available_tools().is_empty());
    }

    #[test]
    fn test_custom_tool_supplies_builtin_handler() {
        let mut config = FileToolsConfig::default();
        config.custom.insert("portscan".to_string(), custom("nmap {target}"));
        config.custom.insert("whois".to_string(), custom("whois {domain}"));

        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.spec().len(), 7);
        assert!(registry.is_tool_available("portscan"));
        assert_eq!(registry.origin("portscan"), Some(ToolOrigin::External));
        assert_eq!(registry.available_tools(), vec!["portscan", "whois"]);
    }

    #[test]
    fn test_empty_command_is_config_error() {
        let mut config = FileToolsConfig::default();
        config.custom.insert("noop".to_string(), custom(""));
        let err = build_registry(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTool { name, .. } if name == "noop"));
    }
}
