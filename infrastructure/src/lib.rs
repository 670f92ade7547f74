//! Infrastructure layer for vigil
//!
//! Adapters implementing the application layer's ports:
//!
//! - [`providers`]: Anthropic, OpenAI and local Ollama [`LlmBackend`](vigil_application::LlmBackend)s
//! - [`tools`]: the built-in scanner catalogue and shell command tools
//! - [`config`]: layered TOML/environment configuration
//! - [`logging`]: JSONL persistence of progress events

pub mod config;
pub mod logging;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use logging::JsonlProgressLogger;
pub use providers::{AnthropicBackend, OllamaBackend, OpenAiBackend, backends_for};
pub use tools::{CommandTool, build_registry};
