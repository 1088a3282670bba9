//! Error types for rule evaluation.

use std::time::Duration;

use thiserror::Error;

/// A rule could not produce a verdict.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule's own logic failed.
    #[error("rule '{rule}' failed: {reason}")]
    Failed { rule: String, reason: String },

    /// The rule was built from an unusable configuration.
    #[error("rule '{rule}' misconfigured: {reason}")]
    Config { rule: String, reason: String },
}

/// The decision for a request could not be completed.
///
/// None of these may be treated as `Allow` by the caller.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The caller cancelled the decision.
    #[error("evaluation cancelled")]
    Cancelled,

    /// The decision did not finish within its deadline.
    #[error("evaluation timed out after {0:?}")]
    TimedOut(Duration),

    /// A rule failed; propagated unchanged.
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl EvaluationError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::TimedOut(_) => "timeout",
            Self::Rule(_) => "rule_error",
        }
    }
}
