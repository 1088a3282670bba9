//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_decisions_total` (counter): final verdicts by decision
//! - `gate_decision_duration_seconds` (histogram): pipeline latency
//! - `gate_rule_verdicts_total` (counter): per-rule verdicts
//! - `gate_evaluations_aborted_total` (counter): cancelled / timed out / failed decisions
//! - `gate_dns_lookups_total` (counter): reverse lookups by outcome
//! - `gate_dns_cache_entries` (gauge): cached addresses
//! - `gate_range_intervals` (gauge): compiled intervals per rule and family
//! - `gate_config_reloads_total` (counter): reload attempts by result
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::decision::AccessDecision;
use crate::ranges::CompiledRanges;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(decision: AccessDecision, started: Instant) {
    counter!("gate_decisions_total", "decision" => decision.as_str()).increment(1);
    histogram!("gate_decision_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_rule_verdict(rule: &str, verdict: AccessDecision) {
    counter!(
        "gate_rule_verdicts_total",
        "rule" => rule.to_owned(),
        "decision" => verdict.as_str()
    )
    .increment(1);
}

pub fn record_aborted(reason: &'static str) {
    counter!("gate_evaluations_aborted_total", "reason" => reason).increment(1);
}

pub fn record_dns_lookup(result: &'static str) {
    counter!("gate_dns_lookups_total", "result" => result).increment(1);
}

pub fn record_cache_size(entries: usize) {
    gauge!("gate_dns_cache_entries").set(entries as f64);
}

pub fn record_range_table(rule: &str, ranges: &CompiledRanges) {
    gauge!("gate_range_intervals", "rule" => rule.to_owned(), "family" => "ipv4")
        .set(ranges.len_v4() as f64);
    gauge!("gate_range_intervals", "rule" => rule.to_owned(), "family" => "ipv6")
        .set(ranges.len_v6() as f64);
}

pub fn record_config_reload(result: &'static str) {
    counter!("gate_config_reloads_total", "result" => result).increment(1);
}
