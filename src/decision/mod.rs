//! Decision subsystem.
//!
//! # Data Flow
//! ```text
//! RequestInfo (client ip, hostname, country, headers)
//!     → engine.rs (snapshot current pipeline)
//!     → pipeline.rs (rules in configured order)
//!         → rule.rs (each rule returns Allow / Challenge / Block)
//!         → fold by severity, stop at Block
//!     → AccessDecision or EvaluationError
//! ```
//!
//! # Design Decisions
//! - Severity order Allow < Challenge < Block; Allow is neutral
//! - Cancellation aborts the decision entirely
//! - The engine performs no I/O; lookups happen in the adapter

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod rule;
pub mod types;

pub use engine::AccessEngine;
pub use error::{EvaluationError, RuleError};
pub use pipeline::DecisionPipeline;
pub use rule::Rule;
pub use types::{AccessDecision, RequestInfo};
