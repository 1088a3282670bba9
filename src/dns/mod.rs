//! Reverse-DNS subsystem.
//!
//! # Data Flow
//! ```text
//! client IpAddr (from a hostname rule)
//!     → cache.rs (live entry? return it)
//!     → resolver.rs (PTR lookup with timeout, cancellable)
//!     → cache.rs (store: 30 min positive, 5 min negative)
//!     → Option<hostname> matched by the rule
//! ```
//!
//! # Design Decisions
//! - Lookup failures are values (`None`), not errors
//! - Bounded entry count, per-entry TTL chosen by lookup outcome (moka)
//! - Cancelled lookups are not cached

pub mod cache;
pub mod resolver;

pub use cache::{CacheSettings, CachedResolver};
pub use resolver::{HostnameResolver, SystemResolver};
