//! Bounded TTL cache in front of a hostname resolver.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::notification::RemovalCause;
use moka::sync::Cache;
use moka::Expiry;
use tokio_util::sync::CancellationToken;

use super::resolver::HostnameResolver;
use crate::config::DnsConfig;
use crate::observability::metrics;

/// Cache sizing and lifetimes.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
    pub max_entries: usize,
}

impl From<&DnsConfig> for CacheSettings {
    fn from(config: &DnsConfig) -> Self {
        Self {
            positive_ttl: Duration::from_secs(config.positive_ttl_secs),
            negative_ttl: Duration::from_secs(config.negative_ttl_secs),
            max_entries: config.max_entries.max(1),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from(&DnsConfig::default())
    }
}

/// Picks the positive or negative lifetime from the cached value.
struct HostnameExpiry {
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl HostnameExpiry {
    fn ttl(&self, hostname: &Option<String>) -> Duration {
        if hostname.is_some() {
            self.positive_ttl
        } else {
            self.negative_ttl
        }
    }
}

impl Expiry<IpAddr, Option<String>> for HostnameExpiry {
    fn expire_after_create(
        &self,
        _key: &IpAddr,
        value: &Option<String>,
        _current_time: Instant,
    ) -> Option<Duration> {
        Some(self.ttl(value))
    }

    fn expire_after_update(
        &self,
        _key: &IpAddr,
        value: &Option<String>,
        _current_time: Instant,
        _current_duration: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.ttl(value))
    }
}

/// Caches positive and negative lookups of an inner resolver.
///
/// Reads do not extend an entry's lifetime. The entry count is held to
/// `max_entries` by the cache's size-based eviction.
pub struct CachedResolver<R> {
    inner: R,
    entries: Cache<IpAddr, Option<String>>,
}

impl<R: HostnameResolver> CachedResolver<R> {
    pub fn new(inner: R, settings: CacheSettings) -> Self {
        let entries = Cache::builder()
            .max_capacity(settings.max_entries as u64)
            .expire_after(HostnameExpiry {
                positive_ttl: settings.positive_ttl,
                negative_ttl: settings.negative_ttl,
            })
            .eviction_listener(|addr: Arc<IpAddr>, _, cause| {
                if matches!(cause, RemovalCause::Size) {
                    tracing::trace!(client_ip = %addr, "Evicted hostname cache entry");
                }
            })
            .build();

        Self { inner, entries }
    }

    /// Number of live cached addresses.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<R: HostnameResolver> HostnameResolver for CachedResolver<R> {
    async fn resolve(&self, addr: IpAddr, cancel: &CancellationToken) -> Option<String> {
        if let Some(hit) = self.entries.get(&addr) {
            metrics::record_dns_lookup("cache_hit");
            return hit;
        }

        let hostname = self.inner.resolve(addr, cancel).await;

        // An abandoned lookup says nothing about the address.
        if cancel.is_cancelled() {
            return None;
        }

        self.entries.insert(addr, hostname.clone());
        metrics::record_cache_size(self.entries.entry_count() as usize);
        hostname
    }
}
