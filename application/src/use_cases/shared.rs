//! Shared utilities for use cases.

use crate::use_cases::run_agent::AgentError;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
///
/// Returns `Err(AgentError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), AgentError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(AgentError::Cancelled);
    }
    Ok(())
}

/// Await `future` unless the token fires first.
pub(crate) async fn cancellable<T>(
    token: &Option<CancellationToken>,
    future: impl Future<Output = T>,
) -> Result<T, AgentError> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(AgentError::Cancelled),
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_check_cancelled() {
        assert!(check_cancelled(&None).is_ok());
        let token = CancellationToken::new();
        assert!(check_cancelled(&Some(token.clone())).is_ok());
        token.cancel();
        assert!(check_cancelled(&Some(token)).unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellable_stops_pending_future() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = cancellable(&Some(token), tokio::time::sleep(Duration::from_secs(3600))).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_without_token() {
        assert_eq!(cancellable(&None, async { 7 }).await.unwrap(), 7);
    }
}
