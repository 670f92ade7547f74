//! Plain-text rendering of validation results.

use super::validation::ValidationResult;
use std::fmt::Write;

/// Render a validation result as a deterministic text report.
pub fn generate_report(result: &ValidationResult) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "Safety Validation Report");
    let _ = writeln!(report, "========================");
    let _ = writeln!(
        report,
        "Status: {}",
        if result.valid { "VALID" } else { "INVALID" }
    );
    let _ = writeln!(report, "Risk Score: {}/100", result.risk_score);
    let _ = writeln!(
        report,
        "Requires Approval: {}",
        if result.requires_approval { "Yes" } else { "No" }
    );

    if !result.errors.is_empty() {
        let _ = writeln!(report, "\nErrors:");
        for error in &result.errors {
            let _ = writeln!(report, "  - {}", error);
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(report, "\nWarnings:");
        for warning in &result.warnings {
            let _ = writeln!(report, "  - {}", warning);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_layout() {
        let result = ValidationResult::evaluate(
            vec!["Unknown tool: nmap_turbo".into()],
            vec!["Target '10.0.0.5' looks sensitive".into()],
            100,
            50,
        );
        let expected = "Safety Validation Report\n\
                        ========================\n\
                        Status: INVALID\n\
                        Risk Score: 100/100\n\
                        Requires Approval: Yes\n\
                        \n\
                        Errors:\n  \
                        - Unknown tool: nmap_turbo\n\
                        \n\
                        Warnings:\n  \
                        - Target '10.0.0.5' looks sensitive\n";
        assert_eq!(generate_report(&result), expected);
    }

    #[test]
    fn test_report_is_deterministic() {
        let result = ValidationResult::evaluate(vec![], vec![], 20, 50);
        assert_eq!(generate_report(&result), generate_report(&result));
        assert!(!generate_report(&result).contains("Errors:"));
    }
}
