//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for vigil
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author, version, about = "Autonomous security-operations agent")]
#[command(long_about = r#"
vigil turns a natural-language security task into a plan of tool calls,
checks every step against a safety policy, runs the approved steps, and
reflects on each result before deciding what to do next.

Configuration files are loaded from (highest priority first):
1. VIGIL_* environment variables   e.g. VIGIL_AGENT__MAX_RETRIES=5
2. --config <path>                 Explicit config file
3. ./vigil.toml                    Project-level config
4. ~/.config/vigil/config.toml     Global config

Example:
  vigil run "Passive recon of example.com and summarize exposed services"
  vigil run --parallel --events run.jsonl "Audit contract 0xabc on ethereum"
  vigil tools
  vigil providers
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a task through plan, execute and reflect
    Run(RunArgs),
    /// List the tool registry with risk levels and handler presence
    Tools,
    /// Check availability of every provider in the fallback chain
    Providers,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// What the agent should do
    pub task: String,

    /// Run independent steps concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Approve gated tasks and steps without asking
    #[arg(long)]
    pub auto_approve: bool,

    /// Step budget for the run
    #[arg(long, value_name = "N")]
    pub max_steps: Option<usize>,

    /// Time budget for the run, in seconds
    #[arg(long, value_name = "SECS")]
    pub max_duration: Option<u64>,

    /// Append progress events to this JSONL file
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Write the final context snapshot to this JSON file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}
