//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, status codes, addresses)
//! - Keep the reverse-DNS timeout inside the decision deadline
//! - Detect duplicate rule names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - CIDR entries are not validated here; the range compiler skips bad ones

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, StatusCode};
use thiserror::Error;

use crate::config::schema::{GateConfig, RuleConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("challenge status {0} is not a 4xx or 5xx code")]
    InvalidChallengeStatus(u16),

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("rule at position {0} has an empty name")]
    EmptyRuleName(usize),

    #[error("duplicate rule name '{0}'")]
    DuplicateRuleName(String),

    #[error("rule '{0}' sets both 'equals' and 'contains'")]
    ConflictingHeaderMatch(String),

    #[error("rule '{rule}' has invalid country code '{code}'")]
    InvalidCountryCode { rule: String, code: String },

    #[error("rule '{0}' has no patterns")]
    EmptyPatterns(String),

    #[error(
        "dns.lookup_timeout_ms ({lookup_ms}) must be below request.decision_timeout_ms ({decision_ms})"
    )]
    LookupTimeoutTooLong { lookup_ms: u64, decision_ms: u64 },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.request.decision_timeout_ms == 0 {
        errors.push(ValidationError::NotPositive {
            field: "request.decision_timeout_ms",
        });
    }

    if let Some(header) = &config.request.country_header {
        // Matches the trimming done when the request policy is built.
        if HeaderName::from_bytes(header.trim().as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(header.clone()));
        }
    }

    let status_ok = StatusCode::from_u16(config.challenge.status)
        .map(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(false);
    if !status_ok {
        errors.push(ValidationError::InvalidChallengeStatus(
            config.challenge.status,
        ));
    }

    if config.dns.enabled {
        let dns = &config.dns;
        for (field, value) in [
            ("dns.positive_ttl_secs", dns.positive_ttl_secs),
            ("dns.negative_ttl_secs", dns.negative_ttl_secs),
            ("dns.lookup_timeout_ms", dns.lookup_timeout_ms),
        ] {
            if value == 0 {
                errors.push(ValidationError::NotPositive { field });
            }
        }
        if dns.max_entries == 0 {
            errors.push(ValidationError::NotPositive {
                field: "dns.max_entries",
            });
        }
        let decision_ms = config.request.decision_timeout_ms;
        if decision_ms > 0 && dns.lookup_timeout_ms >= decision_ms {
            errors.push(ValidationError::LookupTimeoutTooLong {
                lookup_ms: dns.lookup_timeout_ms,
                decision_ms,
            });
        }
    }

    validate_rules(&config.rules, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_rules(rules: &[RuleConfig], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();

    for (idx, rule) in rules.iter().enumerate() {
        let name = rule.name();
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyRuleName(idx));
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateRuleName(name.to_string()));
        }

        match rule {
            RuleConfig::IpRange(_) => {}
            RuleConfig::Hostname(r) => {
                if r.patterns.iter().all(|p| p.trim().is_empty()) {
                    errors.push(ValidationError::EmptyPatterns(r.name.clone()));
                }
            }
            RuleConfig::Country(r) => {
                for code in &r.countries {
                    let trimmed = code.trim();
                    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
                        errors.push(ValidationError::InvalidCountryCode {
                            rule: r.name.clone(),
                            code: code.clone(),
                        });
                    }
                }
            }
            RuleConfig::Header(r) => {
                if HeaderName::from_bytes(r.header.as_bytes()).is_err() {
                    errors.push(ValidationError::InvalidHeaderName(r.header.clone()));
                }
                if r.equals.is_some() && r.contains.is_some() {
                    errors.push(ValidationError::ConflictingHeaderMatch(r.name.clone()));
                }
            }
        }
    }
}
