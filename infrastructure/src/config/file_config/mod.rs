//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and convert into the domain and
//! application types the agent runs with.

mod agent;
mod providers;
mod tools;

pub use agent::FileAgentConfig;
pub use providers::{FileAnthropicConfig, FileOllamaConfig, FileOpenAiConfig, FileProvidersConfig};
pub use tools::{FileCustomToolConfig, FileCustomToolParameter, FileToolsConfig};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use vigil_domain::{DomainError, SafetyPolicy};

/// Configuration errors surfaced at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid provider chain: {0}")]
    Provider(#[source] DomainError),

    #[error("Invalid custom tool '{name}': {detail}")]
    InvalidTool { name: String, detail: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Safety validator policy
    pub safety: SafetyPolicy,
    /// Agent loop settings
    pub agent: FileAgentConfig,
    /// LLM provider chain and per-provider settings
    pub providers: FileProvidersConfig,
    /// External command tools
    pub tools: FileToolsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[safety]
allow_high_risk_ops = true
blocked_targets = ["\\.internal$"]
require_approval_above_risk = 70

[agent]
parallel = true
max_retries = 2

[providers]
chain = ["openai", "ollama"]

[providers.openai]
model = "gpt-4o-mini"

[tools.custom.whois]
command = "whois {domain}"
risk_level = "low"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.safety.allow_high_risk_ops);
        assert_eq!(config.safety.blocked_targets, vec!["\\.internal$".to_string()]);
        assert_eq!(config.safety.require_approval_above_risk, 70);
        assert_eq!(config.safety.max_steps, 50);
        assert!(config.agent.parallel);
        assert_eq!(config.agent.max_retries, 2);
        assert_eq!(config.providers.chain, vec!["openai", "ollama"]);
        assert_eq!(config.providers.openai.model, "gpt-4o-mini");
        assert_eq!(config.tools.custom["whois"].risk_level, "low");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
    }
}
