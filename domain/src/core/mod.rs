//! Core domain concepts shared across all subdomains.
//!
//! - [`risk::RiskLevel`]: low/medium/high classification with base scores
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: truncation and JSON extraction helpers

pub mod error;
pub mod risk;
pub mod string;
