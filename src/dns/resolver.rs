//! Reverse hostname resolution.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::error::ResolveError;
use hickory_resolver::TokioAsyncResolver;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;

/// Maps a client address to a hostname.
///
/// Failures are reported as `None`, never as errors. Implementations must
/// return promptly once `cancel` fires.
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    async fn resolve(&self, addr: IpAddr, cancel: &CancellationToken) -> Option<String>;
}

/// PTR lookups through the system resolver configuration.
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl SystemResolver {
    /// Build from `/etc/resolv.conf` (or the platform equivalent).
    pub fn from_system_conf(timeout: Duration) -> Result<Self, ResolveError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        Ok(Self { resolver, timeout })
    }
}

#[async_trait]
impl HostnameResolver for SystemResolver {
    async fn resolve(&self, addr: IpAddr, cancel: &CancellationToken) -> Option<String> {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.reverse_lookup(addr));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = lookup => match result {
                Ok(Ok(names)) => {
                    let hostname = names
                        .iter()
                        .next()
                        .map(|name| name.to_string().trim_end_matches('.').to_string());
                    metrics::record_dns_lookup(if hostname.is_some() { "found" } else { "empty" });
                    hostname
                }
                Ok(Err(e)) => {
                    metrics::record_dns_lookup("failed");
                    tracing::debug!(client_ip = %addr, error = %e, "Reverse lookup failed");
                    None
                }
                Err(_) => {
                    metrics::record_dns_lookup("timeout");
                    tracing::debug!(client_ip = %addr, timeout = ?self.timeout, "Reverse lookup timed out");
                    None
                }
            },
        }
    }
}
