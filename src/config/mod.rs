//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds rules and adapter settings
//!     → atomic swap; in-flight requests finish on the old snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A rejected reload keeps the running configuration

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ChallengeAction, ChallengeConfig, CountryRuleConfig, DnsConfig, GateConfig,
    HeaderRuleConfig, HostnameRuleConfig, IpRangeRuleConfig, ListenerConfig,
    ObservabilityConfig, RequestConfig, RuleConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
