//! Client address range rule.

use std::net::IpAddr;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::decision::{AccessDecision, RequestInfo, Rule, RuleError};
use crate::ranges::{compile, CompiledRanges};

/// Blocks clients inside any configured prefix.
///
/// A request without a client address is challenged: the rule cannot tell
/// whether it is in range, so it fails toward friction rather than open.
#[derive(Debug, Clone)]
pub struct IpRangeRule {
    name: String,
    ranges: CompiledRanges,
}

impl IpRangeRule {
    /// Compile `prefixes` into a rule. Malformed entries are skipped.
    pub fn new<I, S>(name: impl Into<String>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let ranges = compile(prefixes);
        if ranges.skipped() > 0 {
            tracing::warn!(
                rule = %name,
                skipped = ranges.skipped(),
                "Some address ranges could not be parsed"
            );
        }
        Self { name, ranges }
    }

    pub fn ranges(&self) -> &CompiledRanges {
        &self.ranges
    }

    /// Synchronous verdict for an optional client address.
    pub fn decide(&self, client_ip: Option<IpAddr>) -> AccessDecision {
        match client_ip {
            None => AccessDecision::Challenge,
            Some(ip) if self.ranges.contains(ip) => AccessDecision::Block,
            Some(_) => AccessDecision::Allow,
        }
    }
}

#[async_trait]
impl Rule for IpRangeRule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        request: &RequestInfo,
        _cancel: &CancellationToken,
    ) -> Result<AccessDecision, RuleError> {
        Ok(self.decide(request.client_ip()))
    }
}
