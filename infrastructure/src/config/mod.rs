//! Configuration file loading for vigil
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VIGIL_*` environment variables, nested with `__`
//! 2. `--config <path>` specified file
//! 3. Project root: `./vigil.toml`
//! 4. Global: `$XDG_CONFIG_HOME/vigil/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigError, FileAgentConfig, FileAnthropicConfig, FileConfig, FileCustomToolConfig,
    FileCustomToolParameter, FileOllamaConfig, FileOpenAiConfig, FileProvidersConfig,
    FileToolsConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX, PROJECT_CONFIG_FILE};
