//! Reverse-resolved hostname rule.
//!
//! The rule resolves the client address itself, so the lookup runs in
//! pipeline order and is skipped when an earlier rule already blocked.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::decision::{AccessDecision, RequestInfo, Rule, RuleError};
use crate::dns::HostnameResolver;

/// Exact hostname or `*.suffix` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    Exact(String),
    /// Stored with its leading dot, e.g. ".example.com".
    Suffix(String),
}

impl HostPattern {
    fn parse(raw: &str) -> Option<Self> {
        let raw = normalize(raw);
        if raw.is_empty() || raw == "*" {
            return None;
        }
        match raw.strip_prefix("*.") {
            Some("") => None,
            Some(rest) => Some(HostPattern::Suffix(format!(".{rest}"))),
            None => Some(HostPattern::Exact(raw)),
        }
    }

    fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Exact(name) => host == name,
            // "*.example.com" matches "a.example.com" and the apex itself.
            HostPattern::Suffix(suffix) => host.ends_with(suffix.as_str()) || host == &suffix[1..],
        }
    }
}

fn normalize(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Applies `action` when the client's hostname matches a pattern.
#[derive(Clone)]
pub struct HostnameRule {
    name: String,
    patterns: Vec<HostPattern>,
    action: AccessDecision,
    on_missing: AccessDecision,
    resolver: Option<Arc<dyn HostnameResolver>>,
}

impl fmt::Debug for HostnameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostnameRule")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .field("action", &self.action)
            .field("on_missing", &self.on_missing)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl HostnameRule {
    pub fn new<I, S>(
        name: impl Into<String>,
        patterns: I,
        action: AccessDecision,
        on_missing: AccessDecision,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            patterns: patterns
                .into_iter()
                .filter_map(|p| HostPattern::parse(p.as_ref()))
                .collect(),
            action,
            on_missing,
            resolver: None,
        }
    }

    /// Resolve client addresses through `resolver` when the request
    /// carries no hostname.
    pub fn with_resolver(mut self, resolver: Option<Arc<dyn HostnameResolver>>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn decide(&self, hostname: Option<&str>) -> AccessDecision {
        let Some(hostname) = hostname else {
            return self.on_missing;
        };
        let host = normalize(hostname);
        if self.patterns.iter().any(|p| p.matches(&host)) {
            self.action
        } else {
            AccessDecision::Allow
        }
    }
}

#[async_trait]
impl Rule for HostnameRule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        request: &RequestInfo,
        cancel: &CancellationToken,
    ) -> Result<AccessDecision, RuleError> {
        if let Some(hostname) = request.hostname() {
            return Ok(self.decide(Some(hostname)));
        }

        let resolved = match (&self.resolver, request.client_ip()) {
            (Some(resolver), Some(addr)) => resolver.resolve(addr, cancel).await,
            _ => None,
        };
        Ok(self.decide(resolved.as_deref()))
    }
}
