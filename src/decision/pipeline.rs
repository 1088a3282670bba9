//! Ordered rule evaluation with severity aggregation.
//!
//! # Responsibilities
//! - Run configured rules one after another for a single request
//! - Keep the most severe verdict seen so far
//! - Stop as soon as the running verdict is `Block`
//! - Abort the whole decision on cancellation
//!
//! # Design Decisions
//! - Rules never run concurrently with each other within one request
//! - A verdict can only raise the running decision, never lower it
//! - Rule errors are propagated, not swallowed

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::error::EvaluationError;
use super::rule::Rule;
use super::types::{AccessDecision, RequestInfo};
use crate::observability::metrics;

/// Ordered list of rules evaluated per request.
#[derive(Debug, Default, Clone)]
pub struct DecisionPipeline {
    rules: Vec<Arc<dyn Rule>>,
}

impl DecisionPipeline {
    pub fn new(rules: Vec<Arc<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate all rules in order and fold their verdicts.
    ///
    /// Returns `Err(Cancelled)` if `cancel` fires before the decision is
    /// complete; no partial verdict is returned in that case.
    pub async fn evaluate(
        &self,
        request: &RequestInfo,
        cancel: &CancellationToken,
    ) -> Result<AccessDecision, EvaluationError> {
        let mut decision = AccessDecision::Allow;

        for rule in &self.rules {
            if cancel.is_cancelled() {
                return Err(EvaluationError::Cancelled);
            }

            let verdict = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(EvaluationError::Cancelled),
                verdict = rule.evaluate(request, cancel) => verdict?,
            };

            metrics::record_rule_verdict(rule.name(), verdict);
            tracing::debug!(rule = rule.name(), verdict = %verdict, "Rule evaluated");

            if verdict > decision {
                decision = verdict;
            }

            if decision == AccessDecision::Block {
                tracing::debug!(rule = rule.name(), "Short-circuiting on block");
                return Ok(decision);
            }
        }

        Ok(decision)
    }
}
