//! Fallback selection and remediation hints.

use super::classification::ProviderErrorKind;
use super::entities::{ProviderKind, ProviderStatus};

/// First provider after `current` in `chain` that is available with at
/// least one model.
///
/// A `current` that is not in the chain searches the whole chain.
pub fn next_available_provider(
    current: ProviderKind,
    chain: &[ProviderKind],
    statuses: &[ProviderStatus],
) -> Option<ProviderKind> {
    let start = chain
        .iter()
        .position(|p| *p == current)
        .map_or(0, |i| i + 1);

    chain[start..]
        .iter()
        .copied()
        .filter(|p| *p != current)
        .find(|p| {
            statuses
                .iter()
                .any(|s| s.provider == *p && s.is_usable())
        })
}

/// Remediation text for a provider error. Presentation only.
pub fn error_suggestion(error: &str, provider: ProviderKind) -> String {
    let name = provider.display_name();
    match ProviderErrorKind::classify(error) {
        ProviderErrorKind::Credit => format!(
            "{} reports insufficient credits. Top up the account or add another provider to the fallback chain.",
            name
        ),
        ProviderErrorKind::Auth => match provider {
            ProviderKind::Anthropic => {
                "Check that ANTHROPIC_API_KEY holds a valid Anthropic API key.".to_string()
            }
            ProviderKind::OpenAi => {
                "Check that OPENAI_API_KEY holds a valid OpenAI API key.".to_string()
            }
            ProviderKind::Ollama => {
                "Ollama needs no credentials; check any proxy in front of the local server."
                    .to_string()
            }
        },
        ProviderErrorKind::RateLimit => format!(
            "{} is rate limiting requests. Wait before retrying or run steps sequentially.",
            name
        ),
        ProviderErrorKind::Unavailable => match provider {
            ProviderKind::Ollama => {
                "Start the local server with `ollama serve` and install a model with `ollama pull llama3.1`."
                    .to_string()
            }
            _ => format!("{} could not be reached. Check network connectivity.", name),
        },
        ProviderErrorKind::Other => format!(
            "Unexpected {} error. Re-run with -v for details.",
            name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses() -> Vec<ProviderStatus> {
        vec![
            ProviderStatus::available(ProviderKind::Anthropic, vec!["claude".into()]),
            ProviderStatus::unavailable(ProviderKind::OpenAi, "OPENAI_API_KEY not set"),
            ProviderStatus::available(ProviderKind::Ollama, vec!["llama3.1".into()]),
        ]
    }

    #[test]
    fn test_skips_unavailable() {
        let next = next_available_provider(
            ProviderKind::Anthropic,
            &ProviderKind::DEFAULT_CHAIN,
            &statuses(),
        );
        assert_eq!(next, Some(ProviderKind::Ollama));
    }

    #[test]
    fn test_exhausted_chain() {
        let next =
            next_available_provider(ProviderKind::Ollama, &ProviderKind::DEFAULT_CHAIN, &statuses());
        assert_eq!(next, None);
    }

    #[test]
    fn test_local_without_models_is_skipped() {
        let statuses = vec![
            ProviderStatus::available(ProviderKind::Anthropic, vec!["claude".into()]),
            ProviderStatus::available(ProviderKind::Ollama, vec![]),
        ];
        let next = next_available_provider(
            ProviderKind::Anthropic,
            &ProviderKind::DEFAULT_CHAIN,
            &statuses,
        );
        assert_eq!(next, None);
    }

    #[test]
    fn test_current_outside_chain_searches_all() {
        let chain = [ProviderKind::Anthropic, ProviderKind::Ollama];
        let next = next_available_provider(ProviderKind::OpenAi, &chain, &statuses());
        assert_eq!(next, Some(ProviderKind::Anthropic));
    }

    #[test]
    fn test_suggestions() {
        assert!(error_suggestion("401 unauthorized", ProviderKind::OpenAi).contains("OPENAI_API_KEY"));
        assert!(
            error_suggestion("connection refused", ProviderKind::Ollama).contains("ollama serve")
        );
        assert!(error_suggestion("credit balance is too low", ProviderKind::Anthropic)
            .contains("insufficient credits"));
    }

    #[test]
    fn test_suggestions_for_availability_reasons() {
        assert_eq!(
            error_suggestion("ANTHROPIC_API_KEY is not set", ProviderKind::Anthropic),
            "Check that ANTHROPIC_API_KEY holds a valid Anthropic API key."
        );
        assert!(
            error_suggestion("OPENAI_API_KEY is not set", ProviderKind::OpenAi)
                .contains("OPENAI_API_KEY")
        );
        for reason in [
            "no models installed",
            "model 'qwen2.5' is not installed",
            "not reachable at http://localhost:11434: error sending request",
        ] {
            let hint = error_suggestion(reason, ProviderKind::Ollama);
            assert!(hint.contains("ollama pull"), "{}: {}", reason, hint);
        }
    }
}
