//! Rule implementations.
//!
//! # Data Flow
//! ```text
//! RuleConfig[] (from config file, in order)
//!     → build_rules
//!         ip_range  → ip_range.rs (compiled CIDR tables)
//!         hostname  → hostname.rs (exact / wildcard names)
//!         country   → country.rs (ISO code set)
//!         header    → header.rs (presence / value match)
//!     → Vec<Arc<dyn Rule>> for the decision pipeline
//! ```
//!
//! # Design Decisions
//! - Rules are built whole at configuration time and never patched
//! - Each rule has a defined verdict for missing metadata
//! - Hostname rules share one resolver (and its cache) across reloads

pub mod country;
pub mod hostname;
pub mod header;
pub mod ip_range;

use std::sync::Arc;

pub use country::CountryRule;
pub use header::HeaderRule;
pub use hostname::HostnameRule;
pub use ip_range::IpRangeRule;

use crate::config::schema::RuleConfig;
use crate::decision::{Rule, RuleError};
use crate::dns::HostnameResolver;
use crate::observability::metrics;

/// Build rules from configuration, preserving order.
///
/// Hostname rules resolve client addresses through `resolver`; without
/// one they only see hostnames already present on the request.
pub fn build_rules(
    configs: &[RuleConfig],
    resolver: Option<&Arc<dyn HostnameResolver>>,
) -> Result<Vec<Arc<dyn Rule>>, RuleError> {
    let mut rules: Vec<Arc<dyn Rule>> = Vec::with_capacity(configs.len());

    for config in configs {
        let rule: Arc<dyn Rule> = match config {
            RuleConfig::IpRange(c) => {
                let rule = IpRangeRule::new(&c.name, &c.ranges);
                metrics::record_range_table(&c.name, rule.ranges());
                Arc::new(rule)
            }
            RuleConfig::Hostname(c) => Arc::new(
                HostnameRule::new(&c.name, &c.patterns, c.action, c.on_missing)
                    .with_resolver(resolver.cloned()),
            ),
            RuleConfig::Country(c) => Arc::new(CountryRule::new(
                &c.name,
                &c.countries,
                c.action,
                c.on_missing,
            )),
            RuleConfig::Header(c) => Arc::new(HeaderRule::new(
                &c.name,
                &c.header,
                c.equals.as_deref(),
                c.contains.as_deref(),
                c.action,
                c.on_missing,
            )?),
        };
        rules.push(rule);
    }

    tracing::debug!(count = rules.len(), "Rules built");
    Ok(rules)
}
