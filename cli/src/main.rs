//! CLI entrypoint for vigil
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod args;
mod console;

use anyhow::{Context, Result};
use args::{Cli, Command, RunArgs};
use clap::Parser;
use colored::Colorize;
use console::{ConsoleApproval, ConsoleProgress, severity_label};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use vigil_application::{AgenticCore, FallbackGateway};
use vigil_domain::{ExecutionMode, RiskLevel, SafetyValidator, Task, error_suggestion};
use vigil_infrastructure::{
    ConfigLoader, FileConfig, JsonlProgressLogger, backends_for, build_registry,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    let config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Run(args) => run(config, args, cli.verbose > 0).await,
        Command::Tools => list_tools(&config),
        Command::Providers => check_providers(&config).await,
    }
}

/// `RUST_LOG` wins over `-v`. Logs go to stderr, or to `--log-file`.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .with_context(|| format!("--log-file {} does not name a file", path.display()))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn gateway(config: &FileConfig) -> Result<Arc<FallbackGateway>> {
    let providers = config
        .providers
        .to_provider_config()
        .context("Invalid [providers] configuration")?;
    Ok(Arc::new(FallbackGateway::new(backends_for(&providers))))
}

async fn run(config: FileConfig, args: RunArgs, verbose: bool) -> Result<ExitCode> {
    let registry = Arc::new(build_registry(&config.tools).context("Invalid [tools] configuration")?);
    let validator = SafetyValidator::new(config.safety.clone(), registry.spec().clone())
        .context("Invalid [safety] configuration")?;
    let gateway = gateway(&config)?;

    let mut params = config.agent.to_execution_params();
    if args.auto_approve {
        params = params.with_auto_approve(true);
    }

    let mode = if args.parallel || config.agent.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Sequential
    };
    let mut task = Task::new(&args.task).with_mode(mode);
    if let Some(max_steps) = args.max_steps {
        task = task.with_max_steps(max_steps);
    }
    if let Some(secs) = args.max_duration {
        task = task.with_max_duration(Duration::from_secs(secs));
    }

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            ctrl_c.cancel();
        }
    });

    let mut core = AgenticCore::new(gateway, registry, validator)
        .with_params(params)
        .with_approval(Arc::new(ConsoleApproval))
        .with_listener(Arc::new(ConsoleProgress::new(verbose)))
        .with_cancellation(token);

    if let Some(path) = &args.events {
        let logger = JsonlProgressLogger::new(path)
            .with_context(|| format!("Failed to create events file {}", path.display()))?;
        info!(path = %path.display(), "Recording progress events");
        core = core.with_listener(Arc::new(logger));
    }

    println!("{} {}", "Task".cyan().bold(), args.task);
    let result = core.run(task).await;

    let summary = result.summary();
    println!();
    println!(
        "Steps: {} run, {} succeeded, {} failed | Reflections: {} | Duration: {:.1}s",
        summary.completed_steps,
        summary.successful_steps.to_string().green(),
        summary.failed_steps.to_string().red(),
        summary.reflections,
        summary.duration as f64 / 1000.0
    );
    if summary.findings > 0 {
        println!("{}", "Findings".bold());
        for (severity, findings) in result.context.findings_by_severity() {
            for finding in findings {
                println!("  {} {}", severity_label(severity), finding.title);
                if let Some(remediation) = &finding.remediation {
                    println!("      {}", remediation.dimmed());
                }
            }
        }
    }
    if let Some(error) = &result.error {
        println!("{} {}", "Reason:".red().bold(), error);
    }

    if let Some(path) = &args.export {
        let json = serde_json::to_string_pretty(&result.context)
            .context("Failed to serialize run context")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write context to {}", path.display()))?;
        println!("Context written to {}", path.display());
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn list_tools(config: &FileConfig) -> Result<ExitCode> {
    let registry = build_registry(&config.tools).context("Invalid [tools] configuration")?;

    println!("{}", "Tools".bold());
    for definition in registry.spec().all() {
        let risk = definition.risk_level.to_string();
        let risk = match definition.risk_level {
            RiskLevel::Low => risk.green(),
            RiskLevel::Medium => risk.yellow(),
            RiskLevel::High => risk.red(),
        };
        let handler = if registry.is_tool_available(&definition.name) {
            "ready".green()
        } else {
            "no handler".dimmed()
        };
        let origin = registry
            .origin(&definition.name)
            .map(|origin| origin.as_str())
            .unwrap_or("-");
        let approval = if definition.requires_approval { " approval" } else { "" };

        println!(
            "  {:<18} {:<8} {:<10} {}{}",
            definition.name.cyan(),
            risk,
            handler,
            origin.dimmed(),
            approval.yellow()
        );
        println!("      {}", definition.description.dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

async fn check_providers(config: &FileConfig) -> Result<ExitCode> {
    let gateway = gateway(config)?;
    let statuses = gateway.check_provider_availability().await;

    println!("{}", "Providers (fallback order)".bold());
    for status in &statuses {
        let name = status.provider.display_name();
        if status.is_usable() {
            println!("  {} {:<16} {}", "✓".green(), name, status.models.join(", ").dimmed());
            continue;
        }
        let reason = status.reason.as_deref().unwrap_or("unavailable");
        println!("  {} {:<16} {}", "✗".red(), name, reason.red());
        println!("      {}", error_suggestion(reason, status.provider).dimmed());
    }

    Ok(if statuses.iter().any(|s| s.is_usable()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
