//! Command-template tools
//!
//! A [`CommandTool`] runs a configured shell command. `{param}` placeholders
//! in the template are replaced with the step's parameter values, each
//! shell-escaped, in a single pass so substituted text is never rescanned.
//!
//! ```toml
//! [tools.custom.nmap_top]
//! description = "Top-ports nmap scan"
//! command = "nmap --top-ports {count} -oX - {target}"
//! risk_level = "medium"
//!
//! [tools.custom.nmap_top.parameters.target]
//! type = "string"
//! description = "Host to scan"
//! ```
//!
//! The executor owns the timeout; a command still running when the
//! executor gives up is left to finish on its own.

use async_trait::async_trait;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;
use vigil_application::{InvocationOptions, ToolHandler, ToolHandlerError};

/// Maximum captured stdout (1 MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Longest stderr excerpt carried in a failure
const MAX_STDERR_EXCERPT: usize = 2000;

const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z0-9_]+)\}";

#[derive(Error, Debug)]
pub enum CommandToolError {
    #[error("Command template for '{0}' is empty")]
    EmptyTemplate(String),

    #[error("Invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Command exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Command terminated by signal: {stderr}")]
    Terminated { stderr: String },
}

/// External tool backed by a shell command template.
#[derive(Debug, Clone)]
pub struct CommandTool {
    name: String,
    template: String,
    placeholder: Regex,
}

impl CommandTool {
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<Self, CommandToolError> {
        let name = name.into();
        let template = template.into();
        if template.trim().is_empty() {
            return Err(CommandToolError::EmptyTemplate(name));
        }
        Ok(Self {
            name,
            template,
            placeholder: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Expand the template with escaped parameter values.
    ///
    /// Placeholders without a value expand to nothing.
    pub fn render(&self, parameters: &Map<String, Value>) -> String {
        self.placeholder
            .replace_all(&self.template, |caps: &Captures<'_>| {
                match parameters.get(&caps[1]).map(value_text) {
                    Some(text) if !text.is_empty() => shell_escape(&text),
                    _ => String::new(),
                }
            })
            .into_owned()
    }
}

#[async_trait]
impl ToolHandler for CommandTool {
    async fn invoke(
        &self,
        parameters: &Map<String, Value>,
        options: &InvocationOptions,
    ) -> Result<Value, ToolHandlerError> {
        let command_line = self.render(parameters);
        debug!(
            tool = %self.name,
            step_id = %options.step_id,
            attempt = options.attempt,
            command = %command_line,
            "Running command tool"
        );

        let output = shell_command(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(CommandToolError::Spawn)?;

        if !output.status.success() {
            let stderr = excerpt(&String::from_utf8_lossy(&output.stderr), MAX_STDERR_EXCERPT);
            let error = match output.status.code() {
                Some(code) => CommandToolError::NonZeroExit { code, stderr },
                None => CommandToolError::Terminated { stderr },
            };
            return Err(error.into());
        }

        Ok(parse_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn shell_command(command_line: &str) -> Command {
    if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command_line]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command_line]);
        c
    }
}

/// JSON when stdout parses as JSON, otherwise the (possibly truncated) text.
fn parse_output(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    if !trimmed.is_empty()
        && let Ok(value) = serde_json::from_str::<Value>(trimmed)
    {
        return value;
    }
    Value::String(excerpt(stdout, MAX_OUTPUT_SIZE))
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn excerpt(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... (output truncated)", &text[..end])
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn shell_escape(s: &str) -> String {
    if s.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | ','))
    {
        return s.to_string();
    }

    if cfg!(target_os = "windows") {
        shell_escape_windows(s)
    } else {
        shell_escape_unix(s)
    }
}

/// Single-quote the value; embedded quotes close, escape and reopen.
fn shell_escape_unix(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);
    escaped.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

fn shell_escape_windows(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len() + 4);
    escaped.push('"');
    for ch in s.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '%' => escaped.push_str("%%"),
            '!' => escaped.push_str("^!"),
            _ => escaped.push(ch),
        }
    }
    escaped.push('"');
    escaped
}
