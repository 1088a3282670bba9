//! Request metadata extraction.
//!
//! # Responsibilities
//! - Determine the client address (socket peer, or trusted forwarding headers)
//! - Read the upstream-provided country code
//! - Package everything rules may inspect into a `RequestInfo`
//!
//! # Design Decisions
//! - Forwarding headers are ignored unless explicitly trusted
//! - Trusted proxies are matched with the same range tables rules use
//! - Hostname lookup is not done here; it needs the per-request cancel token

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, HeaderName, Request},
};

use crate::config::RequestConfig;
use crate::decision::RequestInfo;
use crate::ranges::{compile, CompiledRanges};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// How client metadata is read from a request.
#[derive(Debug, Clone, Default)]
pub struct RequestPolicy {
    trust_forwarded_for: bool,
    /// `None` trusts every peer.
    trusted_proxies: Option<CompiledRanges>,
    country_header: Option<HeaderName>,
}

impl RequestPolicy {
    pub fn from_config(config: &RequestConfig) -> Self {
        let trusted_proxies = if config.trusted_proxies.is_empty() {
            None
        } else {
            Some(compile(&config.trusted_proxies))
        };

        let country_header = config.country_header.as_deref().and_then(|name| {
            HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|_| tracing::warn!(header = %name, "Ignoring invalid country header name"))
                .ok()
        });

        Self {
            trust_forwarded_for: config.trust_forwarded_for,
            trusted_proxies,
            country_header,
        }
    }

    /// Effective client address for a request received from `peer`.
    pub fn client_ip(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> Option<IpAddr> {
        if !self.trust_forwarded_for || !self.is_trusted(peer) {
            return peer;
        }

        forwarded_for(headers).or_else(|| real_ip(headers)).or(peer)
    }

    fn is_trusted(&self, peer: Option<IpAddr>) -> bool {
        match (&self.trusted_proxies, peer) {
            (None, _) => true,
            (Some(ranges), Some(addr)) => ranges.contains(addr),
            (Some(_), None) => false,
        }
    }

    /// Country code from the configured header, if any.
    pub fn country(&self, headers: &HeaderMap) -> Option<String> {
        let name = self.country_header.as_ref()?;
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Metadata for `request`, without a hostname.
    pub fn request_info(&self, request: &Request<Body>) -> RequestInfo {
        let headers = request.headers();
        let client_ip = self.client_ip(peer_addr(request), headers);

        RequestInfo::new(client_ip)
            .with_country(self.country(headers))
            .with_headers(headers.clone())
    }
}

/// Socket peer recorded by `into_make_service_with_connect_info`.
pub fn peer_addr(request: &Request<Body>) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Left-most parseable `X-Forwarded-For` entry.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .find_map(parse_addr)
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_addr)
}

/// Accepts bare addresses and `addr:port` / `[v6]:port` forms.
fn parse_addr(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}
