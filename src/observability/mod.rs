//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (client_ip, rule, decision) on every decision event
//! - Metrics are cheap (atomic increments)
//! - Metrics endpoint is optional

pub mod logging;
pub mod metrics;
