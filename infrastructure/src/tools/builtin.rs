//! Built-in scanner catalogue
//!
//! Declares the standard scanner family. The scanners themselves run
//! outside vigil, so these definitions carry no handler: planning and
//! validation see them, and an external tool of the same name supplies the
//! implementation.

use serde_json::json;
use vigil_domain::{ParamType, RiskLevel, ToolDefinition, ToolParameter};

pub const RECON_WEB: &str = "recon_web";
pub const WEBSCAN_QUICK: &str = "webscan_quick";
pub const PORTSCAN: &str = "portscan";
pub const OSINT_LOOKUP: &str = "osint_lookup";
pub const LOG_ANALYZE: &str = "log_analyze";
pub const CONTRACT_AUDIT: &str = "contract_audit";

pub fn recon_web_definition() -> ToolDefinition {
    ToolDefinition::new(
        RECON_WEB,
        "Passive web reconnaissance: DNS records, subdomains, technologies and exposed metadata",
        RiskLevel::Low,
    )
    .with_parameter(
        ToolParameter::new("target", "Domain or URL to investigate", true)
            .with_type(ParamType::String),
    )
    .with_parameter(
        ToolParameter::new("depth", "Crawl depth for link discovery", false)
            .with_type(ParamType::Integer)
            .with_default(1),
    )
}

pub fn webscan_quick_definition() -> ToolDefinition {
    ToolDefinition::new(
        WEBSCAN_QUICK,
        "Quick web vulnerability scan: security headers, TLS, common misconfigurations",
        RiskLevel::Medium,
    )
    .with_parameter(ToolParameter::new("url", "URL to scan", true).with_type(ParamType::String))
    .with_parameter(
        ToolParameter::new("timeout", "Scan timeout in seconds", false)
            .with_type(ParamType::Integer)
            .with_default(30),
    )
}

pub fn portscan_definition() -> ToolDefinition {
    ToolDefinition::new(
        PORTSCAN,
        "TCP port scan of a host",
        RiskLevel::Medium,
    )
    .requiring_approval()
    .with_parameter(
        ToolParameter::new("target", "Host name or IP address", true).with_type(ParamType::String),
    )
    .with_parameter(
        ToolParameter::new("ports", "Port list or range, e.g. \"22,80,443\" or \"1-1024\"", false)
            .with_type(ParamType::String)
            .with_default("1-1024"),
    )
    .with_parameter(
        ToolParameter::new("scan_type", "Scan technique: connect or syn", false)
            .with_type(ParamType::String)
            .with_default("connect"),
    )
}

pub fn osint_lookup_definition() -> ToolDefinition {
    ToolDefinition::new(
        OSINT_LOOKUP,
        "Open-source intelligence lookup for a domain, address, handle or email",
        RiskLevel::Low,
    )
    .with_parameter(ToolParameter::new("query", "Subject to look up", true).with_type(ParamType::String))
    .with_parameter(
        ToolParameter::new("sources", "Restrict the lookup to these sources", false)
            .with_type(ParamType::Array),
    )
}

pub fn log_analyze_definition() -> ToolDefinition {
    ToolDefinition::new(
        LOG_ANALYZE,
        "Search logs for suspicious activity",
        RiskLevel::Low,
    )
    .with_parameter(
        ToolParameter::new("source", "Log file path or log source name", true)
            .with_type(ParamType::String),
    )
    .with_parameter(
        ToolParameter::new("pattern", "Regex to filter log lines", false).with_type(ParamType::String),
    )
    .with_parameter(
        ToolParameter::new("since", "Only consider entries newer than this (RFC 3339 or e.g. \"24h\")", false)
            .with_type(ParamType::String),
    )
}

pub fn contract_audit_definition() -> ToolDefinition {
    ToolDefinition::new(
        CONTRACT_AUDIT,
        "Static audit of a deployed smart contract",
        RiskLevel::Medium,
    )
    .with_parameter(
        ToolParameter::new("address", "Contract address", true).with_type(ParamType::String),
    )
    .with_parameter(
        ToolParameter::new("chain", "Chain the contract is deployed on", false)
            .with_type(ParamType::String)
            .with_default(json!("ethereum")),
    )
}

/// Every built-in scanner definition.
pub fn builtin_definitions() -> Vec<ToolDefinition> {
    vec![
        recon_web_definition(),
        webscan_quick_definition(),
        portscan_definition(),
        osint_lookup_definition(),
        log_analyze_definition(),
        contract_audit_definition(),
    ]
}
