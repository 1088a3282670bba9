//! Reloadable holder of the active pipeline.
//!
//! Readers take a snapshot per decision; a reload publishes a whole new
//! pipeline. In-flight decisions finish on the snapshot they started with.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;

use super::error::{EvaluationError, RuleError};
use super::pipeline::DecisionPipeline;
use super::types::{AccessDecision, RequestInfo};
use crate::config::schema::RuleConfig;
use crate::dns::HostnameResolver;
use crate::observability::metrics;
use crate::rules::build_rules;

/// Entry point of the decision engine.
pub struct AccessEngine {
    pipeline: ArcSwap<DecisionPipeline>,
    /// Handed to hostname rules on every (re)build.
    resolver: Option<Arc<dyn HostnameResolver>>,
}

impl fmt::Debug for AccessEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessEngine")
            .field("pipeline", &self.pipeline.load_full())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl AccessEngine {
    pub fn new(pipeline: DecisionPipeline) -> Self {
        Self {
            pipeline: ArcSwap::from_pointee(pipeline),
            resolver: None,
        }
    }

    /// Build an engine from rule configuration, without reverse DNS.
    pub fn from_config(rules: &[RuleConfig]) -> Result<Self, RuleError> {
        Self::with_resolver(rules, None)
    }

    /// Build an engine whose hostname rules resolve through `resolver`.
    pub fn with_resolver(
        rules: &[RuleConfig],
        resolver: Option<Arc<dyn HostnameResolver>>,
    ) -> Result<Self, RuleError> {
        let pipeline = DecisionPipeline::new(build_rules(rules, resolver.as_ref())?);
        Ok(Self {
            pipeline: ArcSwap::from_pointee(pipeline),
            resolver,
        })
    }

    /// Current pipeline snapshot.
    pub fn pipeline(&self) -> Arc<DecisionPipeline> {
        self.pipeline.load_full()
    }

    /// Publish a new pipeline.
    pub fn replace(&self, pipeline: DecisionPipeline) {
        tracing::info!(rules = pipeline.len(), "Decision pipeline replaced");
        self.pipeline.store(Arc::new(pipeline));
    }

    /// Rebuild the pipeline from rule configuration and publish it.
    ///
    /// On error the current pipeline stays active.
    pub fn reload(&self, rules: &[RuleConfig]) -> Result<(), RuleError> {
        let pipeline = DecisionPipeline::new(build_rules(rules, self.resolver.as_ref())?);
        self.replace(pipeline);
        Ok(())
    }

    /// Decide one request against the current snapshot.
    pub async fn evaluate(
        &self,
        request: &RequestInfo,
        cancel: &CancellationToken,
    ) -> Result<AccessDecision, EvaluationError> {
        let pipeline = self.pipeline.load_full();
        let started = Instant::now();

        let result = pipeline.evaluate(request, cancel).await;
        match &result {
            Ok(decision) => metrics::record_decision(*decision, started),
            Err(err) => metrics::record_aborted(err.reason()),
        }

        result
    }
}

impl Default for AccessEngine {
    fn default() -> Self {
        Self::new(DecisionPipeline::default())
    }
}
