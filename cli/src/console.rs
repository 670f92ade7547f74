//! Console progress output and interactive approval.

use async_trait::async_trait;
use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use vigil_application::{ApprovalError, ApprovalPort, ProgressListener};
use vigil_domain::core::string::truncate;
use vigil_domain::{ProgressEvent, ProgressEventKind, Severity, Step, Task, ValidationResult};

/// Prints progress events as they happen.
pub struct ConsoleProgress {
    verbose: bool,
}

impl ConsoleProgress {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

pub fn severity_label(severity: Severity) -> ColoredString {
    let label = severity.as_str().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::High => label.red(),
        Severity::Medium => label.yellow(),
        Severity::Low => label.blue(),
        Severity::Info => label.dimmed(),
    }
}

impl ProgressListener for ConsoleProgress {
    fn on_event(&self, event: &ProgressEvent) {
        let counter = format!("[{}/{}]", event.progress.current, event.progress.total).dimmed();
        match event.kind {
            ProgressEventKind::Plan => {
                println!("{} {}", "Plan".cyan().bold(), event.message);
            }
            ProgressEventKind::StepStart => {
                println!("{} {} {}", counter, "→".blue(), event.message);
                if self.verbose
                    && let Some(step) = &event.step
                {
                    println!(
                        "      {} {}",
                        step.tool.cyan(),
                        truncate(&serde_json::Value::Object(step.parameters.clone()).to_string(), 80)
                            .dimmed()
                    );
                }
            }
            ProgressEventKind::StepComplete => match &event.result {
                Some(result) if result.success => {
                    println!(
                        "{} {} {} {}",
                        counter,
                        "✓".green(),
                        event.message,
                        format!("({} ms)", result.duration).dimmed()
                    );
                }
                Some(result) => {
                    let error = result
                        .error
                        .as_ref()
                        .map(|e| e.to_string())
                        .unwrap_or_default();
                    println!("{} {} {}", counter, "✗".red(), event.message);
                    println!("      {}", truncate(&error, 120).red());
                }
                None => println!("{} {}", counter, event.message),
            },
            ProgressEventKind::Reflection => {
                if let Some(reflection) = &event.reflection {
                    println!(
                        "      {} {} {}",
                        "↳".dimmed(),
                        reflection.next_action.to_string().magenta(),
                        format!("(confidence {:.2})", reflection.confidence).dimmed()
                    );
                    if self.verbose && !reflection.reasoning.is_empty() {
                        println!("        {}", truncate(&reflection.reasoning, 160).dimmed());
                    }
                }
            }
            ProgressEventKind::Finding => {
                if let Some(finding) = &event.finding {
                    println!("      {} {}", severity_label(finding.severity), finding.title.bold());
                }
            }
            ProgressEventKind::Completed => {
                println!();
                println!("{} {}", "Completed".green().bold(), event.message);
            }
            ProgressEventKind::Failed => {
                println!();
                println!("{} {}", "Failed".red().bold(), event.message);
            }
            ProgressEventKind::Aborted => {
                println!();
                println!("{} {}", "Aborted".yellow().bold(), event.message);
            }
        }
    }
}

/// Asks on the terminal before risky work runs.
pub struct ConsoleApproval;

impl ConsoleApproval {
    fn print_validation(validation: &ValidationResult) {
        println!("  Risk score: {}", validation.risk_score.to_string().yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }

    /// Blocking stdin read off the async runtime. EOF counts as cancel.
    async fn ask(question: String) -> Result<bool, ApprovalError> {
        tokio::task::spawn_blocking(move || {
            print!("{} [y/N] ", question.bold());
            io::stdout()
                .flush()
                .map_err(|e| ApprovalError::Io(e.to_string()))?;

            let mut line = String::new();
            let read = io::stdin()
                .read_line(&mut line)
                .map_err(|e| ApprovalError::Io(e.to_string()))?;
            if read == 0 {
                return Err(ApprovalError::Cancelled);
            }
            Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
        })
        .await
        .map_err(|e| ApprovalError::Io(e.to_string()))?
    }
}

#[async_trait]
impl ApprovalPort for ConsoleApproval {
    async fn approve_task(
        &self,
        task: &Task,
        validation: &ValidationResult,
    ) -> Result<bool, ApprovalError> {
        println!();
        println!("{}", "Task requires approval".yellow().bold());
        println!("  {}", truncate(&task.description, 200));
        Self::print_validation(validation);
        Self::ask("Run this task?".to_string()).await
    }

    async fn approve_step(
        &self,
        step: &Step,
        validation: &ValidationResult,
    ) -> Result<bool, ApprovalError> {
        println!();
        println!(
            "{} step {}: {}",
            "Approval required for".yellow().bold(),
            step.step_number,
            step.description
        );
        println!(
            "  Tool: {} ({} risk)",
            step.tool.cyan(),
            step.risk_level
        );
        let targets = step.targets();
        if !targets.is_empty() {
            println!("  Targets: {}", targets.join(", "));
        }
        Self::print_validation(validation);
        Self::ask(format!("Run {}?", step.tool)).await
    }
}
