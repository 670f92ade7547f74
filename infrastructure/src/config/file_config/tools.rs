//! Tools configuration from TOML (`[tools]` section)
//!
//! External command tools are declared under `[tools.custom.<name>]`:
//!
//! ```toml
//! [tools.custom.whois]
//! description = "WHOIS record for a domain"
//! command = "whois {domain}"
//! risk_level = "low"
//!
//! [tools.custom.whois.parameters.domain]
//! type = "string"
//! description = "Domain to query"
//! ```
//!
//! A custom tool named like a built-in scanner supplies that scanner's
//! implementation.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use vigil_domain::{ParamType, RiskLevel, ToolDefinition, ToolParameter};

/// `[tools]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Command tools keyed by tool name
    pub custom: BTreeMap<String, FileCustomToolConfig>,
}

/// A single `[tools.custom.<name>]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCustomToolConfig {
    #[serde(default)]
    pub description: String,
    /// Shell command with `{param}` placeholders
    pub command: String,
    /// "low", "medium" or "high" (default: "high")
    #[serde(default = "default_risk_level")]
    pub risk_level: String,
    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, FileCustomToolParameter>,
}

/// Parameter of a custom tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCustomToolParameter {
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_risk_level() -> String {
    "high".to_string()
}

fn default_param_type() -> String {
    "string".to_string()
}

fn default_required() -> bool {
    true
}

impl FileCustomToolConfig {
    /// Build the tool definition declared by this entry.
    pub fn to_definition(&self, name: &str) -> Result<ToolDefinition, ConfigError> {
        let invalid = |detail: String| ConfigError::InvalidTool {
            name: name.to_string(),
            detail,
        };

        let risk_level: RiskLevel = self.risk_level.parse().map_err(|e| invalid(format!("{}", e)))?;
        let description = if self.description.is_empty() {
            format!("Custom command: {}", self.command)
        } else {
            self.description.clone()
        };

        let mut definition = ToolDefinition::new(name, description, risk_level);
        if self.requires_approval {
            definition = definition.requiring_approval();
        }

        for (param_name, param) in &self.parameters {
            let param_type: ParamType = param
                .param_type
                .parse()
                .map_err(|e| invalid(format!("parameter '{}': {}", param_name, e)))?;
            let mut parameter = ToolParameter::new(param_name, &param.description, param.required)
                .with_type(param_type);
            if let Some(default) = &param.default {
                parameter = parameter.with_default(default.clone());
            }
            definition = definition.with_parameter(parameter);
        }

        Ok(definition)
    }
}
