//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::decision::AccessDecision;

/// Root configuration for the access gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// How request metadata is extracted from the transport.
    pub request: RequestConfig,

    /// What the adapter does with a `Challenge` verdict.
    pub challenge: ChallengeConfig,

    /// Reverse-DNS lookup and caching.
    pub dns: DnsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Rules, evaluated in the order listed.
    pub rules: Vec<RuleConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Request metadata extraction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Take the client address from X-Forwarded-For / X-Real-IP.
    pub trust_forwarded_for: bool,

    /// Peers allowed to set forwarding headers. Empty trusts every peer.
    pub trusted_proxies: Vec<String>,

    /// Header carrying a 2-letter country code set by an upstream (e.g. "cf-ipcountry").
    pub country_header: Option<String>,

    /// Deadline for hostname lookup plus rule evaluation, in milliseconds.
    pub decision_timeout_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_for: false,
            trusted_proxies: Vec::new(),
            country_header: None,
            decision_timeout_ms: 2000,
        }
    }
}

/// Adapter handling of `Challenge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeAction {
    /// Forward the request and mark it as challenged.
    Pass,
    /// Answer with the configured status without forwarding.
    Reject,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub action: ChallengeAction,

    /// Status used when `action = "reject"`.
    pub status: u16,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            action: ChallengeAction::Pass,
            status: 429,
        }
    }
}

/// Reverse-DNS cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Resolve client hostnames at all.
    pub enabled: bool,

    /// Lifetime of a successful lookup in seconds.
    pub positive_ttl_secs: u64,

    /// Lifetime of a failed or empty lookup in seconds.
    pub negative_ttl_secs: u64,

    /// Maximum cached addresses.
    pub max_entries: usize,

    /// Timeout for a single PTR lookup in milliseconds.
    ///
    /// Must stay below `request.decision_timeout_ms`.
    pub lookup_timeout_ms: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            positive_ttl_secs: 30 * 60,
            negative_ttl_secs: 5 * 60,
            max_entries: 10_000,
            lookup_timeout_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A single rule, tagged by `type`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfig {
    IpRange(IpRangeRuleConfig),
    Hostname(HostnameRuleConfig),
    Country(CountryRuleConfig),
    Header(HeaderRuleConfig),
}

impl RuleConfig {
    pub fn name(&self) -> &str {
        match self {
            RuleConfig::IpRange(r) => &r.name,
            RuleConfig::Hostname(r) => &r.name,
            RuleConfig::Country(r) => &r.name,
            RuleConfig::Header(r) => &r.name,
        }
    }
}

/// Block clients whose address falls in any listed CIDR prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IpRangeRuleConfig {
    pub name: String,

    /// CIDR prefixes; malformed entries are skipped.
    #[serde(default)]
    pub ranges: Vec<String>,
}

/// Match the reverse-resolved hostname against exact or `*.suffix` patterns.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostnameRuleConfig {
    pub name: String,

    pub patterns: Vec<String>,

    #[serde(default = "default_block")]
    pub action: AccessDecision,

    /// Verdict when no hostname could be resolved.
    #[serde(default)]
    pub on_missing: AccessDecision,
}

/// Match the client's country code.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CountryRuleConfig {
    pub name: String,

    pub countries: Vec<String>,

    #[serde(default = "default_block")]
    pub action: AccessDecision,

    /// Verdict when the country is unknown.
    #[serde(default)]
    pub on_missing: AccessDecision,
}

/// Match a request header by presence, exact value or substring.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeaderRuleConfig {
    pub name: String,

    /// Header name (case-insensitive).
    pub header: String,

    /// Case-insensitive exact value.
    #[serde(default)]
    pub equals: Option<String>,

    /// Case-insensitive substring.
    #[serde(default)]
    pub contains: Option<String>,

    #[serde(default = "default_challenge")]
    pub action: AccessDecision,

    /// Verdict when the header is absent.
    #[serde(default)]
    pub on_missing: AccessDecision,
}

fn default_block() -> AccessDecision {
    AccessDecision::Block
}

fn default_challenge() -> AccessDecision {
    AccessDecision::Challenge
}
