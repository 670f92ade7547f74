//! Execute Step use case
//!
//! The [`ToolExecutor`] runs one plan step against the tool registry and
//! always returns a [`StepResult`]. Every failure is classified into a
//! [`StepErrorKind`](vigil_domain::StepErrorKind); handler panics are caught
//! and reported as tool failures.
//!
//! # Retry Backoff
//!
//! Retrying after attempt `n` waits `min(1000 * 2^n, 10000)` ms before
//! running attempt `n + 1`.

use crate::ports::tool_handler::{InvocationOptions, ToolHandlerError};
use crate::tools::ToolRegistry;
use futures::FutureExt;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vigil_domain::{RiskLevel, Step, StepError, StepErrorKind, StepId, StepResult, ToolDefinition};

/// Timeout used when neither the options nor the step provide one.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(60);

const RETRY_BASE_DELAY_MS: u64 = 1_000;
const RETRY_MAX_DELAY_MS: u64 = 10_000;

/// Errors from the executor itself (tool failures are results, not errors).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error(
        "Retry limit reached for step {step_id}: attempt {previous_attempt} of {max_attempts} already made"
    )]
    RetryExhausted {
        step_id: StepId,
        previous_attempt: u32,
        max_attempts: u32,
    },
}

/// Per-call execution options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Overrides the step's estimated duration as the timeout
    pub timeout: Option<Duration>,
}

impl ExecutionOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Backoff before the attempt following `previous_attempt`.
pub fn retry_delay(previous_attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(previous_attempt).unwrap_or(u64::MAX);
    Duration::from_millis(
        RETRY_BASE_DELAY_MS
            .saturating_mul(factor)
            .min(RETRY_MAX_DELAY_MS),
    )
}

/// Runs plan steps through registered tool handlers.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Whether `name` has both a definition and a handler.
    pub fn is_tool_available(&self, name: &str) -> bool {
        self.registry.is_tool_available(name)
    }

    pub fn available_tools(&self) -> Vec<&str> {
        self.registry.available_tools()
    }

    fn effective_risk(&self, step: &Step) -> RiskLevel {
        self.registry
            .definition(&step.tool)
            .map_or(step.risk_level, |tool| step.risk_level.max(tool.risk_level))
    }

    fn timeout_for(step: &Step, options: &ExecutionOptions) -> Duration {
        options
            .timeout
            .or_else(|| step.estimated_duration.map(Duration::from_millis))
            .unwrap_or(DEFAULT_STEP_TIMEOUT)
    }

    /// Run one attempt at `step`. Never returns an error; failures are
    /// recorded in the result.
    pub async fn execute_step(
        &self,
        step: &Step,
        attempt: u32,
        options: &ExecutionOptions,
    ) -> StepResult {
        let started = Instant::now();
        let outcome = self.invoke(step, attempt, options).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(output) => {
                info!(
                    step_id = %step.id,
                    tool = %step.tool,
                    attempt,
                    duration_ms = elapsed.as_millis() as u64,
                    "Tool succeeded"
                );
                StepResult::success(step.id.clone(), &step.tool, output, elapsed, attempt)
            }
            Err(error) => {
                info!(
                    step_id = %step.id,
                    tool = %step.tool,
                    attempt,
                    duration_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "Tool failed"
                );
                StepResult::failure(step.id.clone(), &step.tool, error, elapsed, attempt)
            }
        }
    }

    async fn invoke(
        &self,
        step: &Step,
        attempt: u32,
        options: &ExecutionOptions,
    ) -> Result<Value, StepError> {
        let definition = self
            .registry
            .definition(&step.tool)
            .ok_or_else(|| StepError::tool_not_found(&step.tool))?;
        let handler = self
            .registry
            .handler(&step.tool)
            .ok_or_else(|| StepError::no_executor(&step.tool))?;

        let parameters = resolve_parameters(definition, &step.parameters)?;
        let timeout = Self::timeout_for(step, options);
        let invocation = InvocationOptions {
            step_id: step.id.clone(),
            attempt,
            timeout,
        };

        debug!(step_id = %step.id, tool = %step.tool, ?timeout, "Invoking tool");
        let call = AssertUnwindSafe(handler.invoke(&parameters, &invocation)).catch_unwind();

        match tokio::time::timeout(timeout, call).await {
            Err(_) => Err(StepError::timeout(timeout)),
            Ok(Err(panic)) => Err(StepError::tool_failure(format!(
                "Tool panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Ok(Ok(Err(e))) => Err(StepError::tool_failure(handler_message(&e))),
            Ok(Ok(Ok(output))) => Ok(output),
        }
    }

    /// Run every step concurrently as attempt 1. Results keep input order.
    pub async fn execute_parallel(
        &self,
        steps: &[Step],
        options: &ExecutionOptions,
    ) -> Vec<StepResult> {
        join_all(steps.iter().map(|step| self.execute_step(step, 1, options))).await
    }

    /// Run steps one after another.
    ///
    /// Stops early only when a high-risk step fails. A step is as risky as
    /// the higher of its own level and its tool's.
    pub async fn execute_sequential(
        &self,
        steps: &[Step],
        options: &ExecutionOptions,
    ) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let result = self.execute_step(step, 1, options).await;
            let stop = !result.success && self.effective_risk(step) == RiskLevel::High;
            results.push(result);
            if stop {
                warn!(step_id = %step.id, "High-risk step failed, stopping sequence");
                break;
            }
        }
        results
    }

    /// Retry `step` after the backoff delay for `previous_attempt`.
    pub async fn retry_step(
        &self,
        step: &Step,
        previous_attempt: u32,
        max_attempts: u32,
        options: &ExecutionOptions,
    ) -> Result<StepResult, ExecutorError> {
        if previous_attempt >= max_attempts {
            return Err(ExecutorError::RetryExhausted {
                step_id: step.id.clone(),
                previous_attempt,
                max_attempts,
            });
        }

        let delay = retry_delay(previous_attempt);
        debug!(step_id = %step.id, delay_ms = delay.as_millis() as u64, "Waiting before retry");
        tokio::time::sleep(delay).await;

        Ok(self.execute_step(step, previous_attempt + 1, options).await)
    }
}

/// Apply defaults and check required parameters and declared types.
fn resolve_parameters(
    definition: &ToolDefinition,
    given: &Map<String, Value>,
) -> Result<Map<String, Value>, StepError> {
    let mut parameters = given.clone();
    for param in &definition.parameters {
        match parameters.get(&param.name) {
            Some(value) if !value.is_null() => {
                if !param.param_type.matches(value) {
                    return Err(StepError::new(
                        StepErrorKind::InvalidParameter,
                        format!(
                            "Parameter '{}' must be of type {}",
                            param.name, param.param_type
                        ),
                    ));
                }
            }
            _ => {
                if let Some(default) = &param.default {
                    parameters.insert(param.name.clone(), default.clone());
                } else if param.required {
                    return Err(StepError::missing_parameter(&param.name));
                }
            }
        }
    }
    Ok(parameters)
}

fn handler_message(error: &ToolHandlerError) -> String {
    let message = error.to_string();
    if message.is_empty() {
        "Tool reported an error without a message".to_string()
    } else {
        message
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::tool_handler::ToolHandler;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use vigil_domain::{ParamType, ToolParameter};

    /// Echoes its parameters back and records every invocation.
    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<(Map<String, Value>, InvocationOptions)>>,
    }

    #[async_trait]
    impl ToolHandler for RecordingHandler {
        async fn invoke(
            &self,
            parameters: &Map<String, Value>,
            options: &InvocationOptions,
        ) -> Result<Value, ToolHandlerError> {
            self.calls
                .lock()
                .unwrap()
                .push((parameters.clone(), options.clone()));
            Ok(Value::Object(parameters.clone()))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn invoke(
            &self,
            _: &Map<String, Value>,
            _: &InvocationOptions,
        ) -> Result<Value, ToolHandlerError> {
            Err("connection refused".into())
        }
    }

    struct SlowHandler;

    #[async_trait]
    impl ToolHandler for SlowHandler {
        async fn invoke(
            &self,
            _: &Map<String, Value>,
            _: &InvocationOptions,
        ) -> Result<Value, ToolHandlerError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(json!("too late"))
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl ToolHandler for PanickingHandler {
        async fn invoke(
            &self,
            _: &Map<String, Value>,
            _: &InvocationOptions,
        ) -> Result<Value, ToolHandlerError> {
            panic!("scanner crashed");
        }
    }

    fn portscan() -> ToolDefinition {
        ToolDefinition::new("portscan", "Scan TCP ports", RiskLevel::Medium)
            .with_parameter(ToolParameter::new("target", "Host to scan", true))
            .with_parameter(
                ToolParameter::new("ports", "Port range", false).with_default("1-1024"),
            )
            .with_parameter(
                ToolParameter::new("timeout", "Per-port timeout", false)
                    .with_type(ParamType::Integer),
            )
    }

    fn executor_with(handler: Arc<dyn ToolHandler>) -> ToolExecutor {
        let registry = ToolRegistry::builder()
            .external(portscan(), handler)
            .builtin(
                ToolDefinition::new("recon_web", "Passive recon", RiskLevel::Low),
                None,
            )
            .build();
        ToolExecutor::new(Arc::new(registry))
    }

    fn scan_step() -> Step {
        Step::new("step-1", 1, "Scan ports", "portscan").with_param("target", "example.com")
    }

    #[tokio::test]
    async fn test_success_applies_defaults() {
        let handler = Arc::new(RecordingHandler::default());
        let executor = executor_with(handler.clone());

        let result = executor
            .execute_step(&scan_step(), 1, &ExecutionOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.tool_used, "portscan");
        assert_eq!(result.attempt_number, 1);
        let calls = handler.calls.lock().unwrap();
        assert_eq!(calls[0].0["ports"], json!("1-1024"));
        assert_eq!(calls[0].1.timeout, DEFAULT_STEP_TIMEOUT);
    }

    #[tokio::test]
    async fn test_timeout_from_step_estimate() {
        let handler = Arc::new(RecordingHandler::default());
        let executor = executor_with(handler.clone());
        let step = scan_step().with_estimated_duration(2_500);

        executor
            .execute_step(&step, 1, &ExecutionOptions::default())
            .await;
        executor
            .execute_step(&step, 2, &ExecutionOptions::with_timeout(Duration::from_secs(1)))
            .await;

        let calls = handler.calls.lock().unwrap();
        assert_eq!(calls[0].1.timeout, Duration::from_millis(2_500));
        assert_eq!(calls[1].1.timeout, Duration::from_secs(1));
        assert_eq!(calls[1].1.attempt, 2);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let executor = executor_with(Arc::new(RecordingHandler::default()));
        let step = Step::new("step-1", 1, "Nope", "nmap_full");
        let result = executor
            .execute_step(&step, 1, &ExecutionOptions::default())
            .await;
        assert!(!result.success);
        assert_eq!(result.error_kind(), Some(StepErrorKind::ToolNotFound));
    }

    #[tokio::test]
    async fn test_declared_tool_without_handler() {
        let executor = executor_with(Arc::new(RecordingHandler::default()));
        let step = Step::new("step-1", 1, "Recon", "recon_web");
        let result = executor
            .execute_step(&step, 1, &ExecutionOptions::default())
            .await;
        assert_eq!(result.error_kind(), Some(StepErrorKind::NoExecutor));
        assert!(!executor.is_tool_available("recon_web"));
        assert_eq!(executor.available_tools(), vec!["portscan"]);
    }

    #[tokio::test]
    async fn test_missing_required_parameter() {
        let handler = Arc::new(RecordingHandler::default());
        let executor = executor_with(handler.clone());
        let step = Step::new("step-1", 1, "Scan", "portscan").with_param("target", Value::Null);

        let result = executor
            .execute_step(&step, 1, &ExecutionOptions::default())
            .await;

        assert_eq!(result.error_kind(), Some(StepErrorKind::MissingParameter));
        assert!(handler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parameter_type_mismatch() {
        let executor = executor_with(Arc::new(RecordingHandler::default()));
        let step = scan_step().with_param("timeout", "soon");
        let result = executor
            .execute_step(&step, 1, &ExecutionOptions::default())
            .await;
        assert_eq!(result.error_kind(), Some(StepErrorKind::InvalidParameter));
    }

    #[tokio::test]
    async fn test_handler_error_is_tool_failure() {
        let executor = executor_with(Arc::new(FailingHandler));
        let result = executor
            .execute_step(&scan_step(), 1, &ExecutionOptions::default())
            .await;
        let error = result.error.unwrap();
        assert_eq!(error.kind, StepErrorKind::ToolFailure);
        assert_eq!(error.detail, "connection refused");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_waiting() {
        let executor = executor_with(Arc::new(SlowHandler));
        let started = Instant::now();
        let result = executor
            .execute_step(&scan_step(), 1, &ExecutionOptions::with_timeout(Duration::from_secs(1)))
            .await;

        assert_eq!(result.error_kind(), Some(StepErrorKind::Timeout));
        assert!(started.elapsed() < Duration::from_secs(30));
        assert!(result.duration >= 1_000);
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let executor = executor_with(Arc::new(PanickingHandler));
        let result = executor
            .execute_step(&scan_step(), 1, &ExecutionOptions::default())
            .await;
        let error = result.error.unwrap();
        assert_eq!(error.kind, StepErrorKind::ToolFailure);
        assert!(error.detail.contains("scanner crashed"));
    }

    #[test]
    fn test_retry_delay_schedule() {
        assert_eq!(retry_delay(0), Duration::from_millis(1_000));
        assert_eq!(retry_delay(1), Duration::from_millis(2_000));
        assert_eq!(retry_delay(2), Duration::from_millis(4_000));
        assert_eq!(retry_delay(3), Duration::from_millis(8_000));
        assert_eq!(retry_delay(4), Duration::from_millis(10_000));
        assert_eq!(retry_delay(200), Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_backoff() {
        let executor = executor_with(Arc::new(RecordingHandler::default()));
        let started = Instant::now();

        let result = executor
            .retry_step(&scan_step(), 1, 3, &ExecutionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.attempt_number, 2);
        assert!(started.elapsed() >= Duration::from_millis(2_000));
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let handler = Arc::new(RecordingHandler::default());
        let executor = executor_with(handler.clone());

        let err = executor
            .retry_step(&scan_step(), 3, 3, &ExecutionOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecutorError::RetryExhausted {
                step_id: StepId::new("step-1"),
                previous_attempt: 3,
                max_attempts: 3,
            }
        );
        assert!(handler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parallel_keeps_order() {
        let executor = executor_with(Arc::new(RecordingHandler::default()));
        let steps = vec![
            scan_step(),
            Step::new("step-2", 2, "Unknown", "nmap_full"),
            Step::new("step-3", 3, "Scan", "portscan").with_param("target", "example.org"),
        ];

        let results = executor
            .execute_parallel(&steps, &ExecutionOptions::default())
            .await;

        let ids: Vec<_> = results.iter().map(|r| r.step_id.as_str()).collect();
        assert_eq!(ids, vec!["step-1", "step-2", "step-3"]);
        assert_eq!(
            results.iter().map(|r| r.success).collect::<Vec<_>>(),
            vec![true, false, true]
        );
    }

    #[tokio::test]
    async fn test_sequential_stops_on_high_risk_failure() {
        let executor = executor_with(Arc::new(FailingHandler));
        let steps = vec![
            scan_step(),
            scan_step().with_risk_level(RiskLevel::High),
            scan_step(),
        ];
        let results = executor
            .execute_sequential(&steps, &ExecutionOptions::default())
            .await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_sequential_stops_on_high_risk_tool_failure() {
        let registry = ToolRegistry::builder()
            .external(
                ToolDefinition::new("exploit_run", "Run an exploit", RiskLevel::High)
                    .with_parameter(ToolParameter::new("target", "Host", true)),
                Arc::new(FailingHandler),
            )
            .external(portscan(), Arc::new(FailingHandler))
            .build();
        let executor = ToolExecutor::new(Arc::new(registry));
        let exploit = Step::new("step-1", 1, "Exploit", "exploit_run").with_param("target", "example.com");
        assert_eq!(exploit.risk_level, RiskLevel::Low);

        let results = executor
            .execute_sequential(&[exploit, scan_step()], &ExecutionOptions::default())
            .await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
    }
}
