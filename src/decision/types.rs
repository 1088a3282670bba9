//! Decision verdicts and the per-request metadata snapshot.

use std::fmt;
use std::net::IpAddr;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Verdict for one request, ordered by severity: `Allow < Challenge < Block`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessDecision {
    #[default]
    Allow,
    Challenge,
    Block,
}

impl AccessDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Challenge => "challenge",
            Self::Block => "block",
        }
    }
}

impl fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable metadata of one inbound request.
///
/// Built once by the transport adapter and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    client_ip: Option<IpAddr>,
    country_code: Option<String>,
    hostname: Option<String>,
    headers: HeaderMap,
}

impl RequestInfo {
    /// Start a snapshot for a client address (absent if unknown).
    pub fn new(client_ip: Option<IpAddr>) -> Self {
        Self {
            client_ip,
            ..Self::default()
        }
    }

    /// Attach the reverse-resolved hostname.
    pub fn with_hostname(mut self, hostname: Option<String>) -> Self {
        self.hostname = hostname;
        self
    }

    /// Attach the resolved ISO country code, stored uppercase.
    pub fn with_country(mut self, country_code: Option<String>) -> Self {
        self.country_code = country_code
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty());
        self
    }

    /// Replace the header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Append a single header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Header lookup; names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
