//! Inline access-control gate.
//!
//! Decides, per request, whether a client is allowed, challenged or
//! blocked, based on request metadata and an ordered list of rules.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ http::middleware::access_control
//!                                            │
//!                          http::request ◀───┤ (client ip, country, headers)
//!                                            ▼
//!                                  decision::AccessEngine
//!                                   (ArcSwap<DecisionPipeline>)
//!                                            │
//!                              rules::{ip_range, hostname, country, header}
//!                                     │               │
//!                 ranges (CIDR → interval tables)   dns (cached reverse lookup)
//!
//!     Cross-cutting: config (TOML, validation, hot reload),
//!                    observability (tracing, Prometheus), lifecycle
//! ```

pub mod config;
pub mod decision;
pub mod dns;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod ranges;
pub mod rules;

pub use config::schema::GateConfig;
pub use decision::{AccessDecision, AccessEngine, DecisionPipeline, RequestInfo, Rule};
pub use http::GateServer;
pub use lifecycle::Shutdown;
