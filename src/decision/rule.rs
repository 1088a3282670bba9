//! The rule capability.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::RuleError;
use super::types::{AccessDecision, RequestInfo};

/// One independent check over request metadata.
///
/// Rules may suspend (e.g. waiting on a lookup) and must stop promptly
/// once `cancel` fires. Rules without I/O simply ignore the token.
#[async_trait]
pub trait Rule: Send + Sync + fmt::Debug {
    /// Identifier used in logs and metrics.
    fn name(&self) -> &str;

    /// Produce a verdict for `request`.
    async fn evaluate(
        &self,
        request: &RequestInfo,
        cancel: &CancellationToken,
    ) -> Result<AccessDecision, RuleError>;
}
