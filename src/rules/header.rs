//! Request header rule.

use async_trait::async_trait;
use axum::http::HeaderName;
use tokio_util::sync::CancellationToken;

use crate::decision::{AccessDecision, RequestInfo, Rule, RuleError};

#[derive(Debug, Clone)]
enum ValueMatch {
    Any,
    Equals(String),
    Contains(String),
}

/// Applies `action` when a header is present and its value matches.
#[derive(Debug, Clone)]
pub struct HeaderRule {
    name: String,
    header: HeaderName,
    value: ValueMatch,
    action: AccessDecision,
    on_missing: AccessDecision,
}

impl HeaderRule {
    /// Build a header rule. Fails if `header` is not a valid header name.
    pub fn new(
        name: impl Into<String>,
        header: &str,
        equals: Option<&str>,
        contains: Option<&str>,
        action: AccessDecision,
        on_missing: AccessDecision,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let header = HeaderName::from_bytes(header.as_bytes()).map_err(|e| RuleError::Config {
            rule: name.clone(),
            reason: e.to_string(),
        })?;
        let value = match (equals, contains) {
            (Some(v), _) => ValueMatch::Equals(v.to_ascii_lowercase()),
            (None, Some(v)) => ValueMatch::Contains(v.to_ascii_lowercase()),
            (None, None) => ValueMatch::Any,
        };
        Ok(Self {
            name,
            header,
            value,
            action,
            on_missing,
        })
    }

    pub fn decide(&self, request: &RequestInfo) -> AccessDecision {
        let mut values = request.headers().get_all(&self.header).into_iter().peekable();
        if values.peek().is_none() {
            return self.on_missing;
        }

        let matched = values.any(|raw| {
            let value = String::from_utf8_lossy(raw.as_bytes()).to_ascii_lowercase();
            match &self.value {
                ValueMatch::Any => true,
                ValueMatch::Equals(expected) => value.trim() == expected.as_str(),
                ValueMatch::Contains(needle) => value.contains(needle.as_str()),
            }
        });

        if matched {
            self.action
        } else {
            AccessDecision::Allow
        }
    }
}

#[async_trait]
impl Rule for HeaderRule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        request: &RequestInfo,
        _cancel: &CancellationToken,
    ) -> Result<AccessDecision, RuleError> {
        Ok(self.decide(request))
    }
}
