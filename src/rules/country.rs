//! Country code rule.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::decision::{AccessDecision, RequestInfo, Rule, RuleError};

/// Applies `action` to requests from listed countries.
#[derive(Debug, Clone)]
pub struct CountryRule {
    name: String,
    countries: HashSet<String>,
    action: AccessDecision,
    on_missing: AccessDecision,
}

impl CountryRule {
    pub fn new<I, S>(
        name: impl Into<String>,
        countries: I,
        action: AccessDecision,
        on_missing: AccessDecision,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            countries: countries
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
            action,
            on_missing,
        }
    }

    pub fn decide(&self, country: Option<&str>) -> AccessDecision {
        match country {
            None => self.on_missing,
            Some(code) if self.countries.contains(&code.to_ascii_uppercase()) => self.action,
            Some(_) => AccessDecision::Allow,
        }
    }
}

#[async_trait]
impl Rule for CountryRule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        request: &RequestInfo,
        _cancel: &CancellationToken,
    ) -> Result<AccessDecision, RuleError> {
        Ok(self.decide(request.country_code()))
    }
}
