//! Address range subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration time:
//!     ["10.0.0.0/24", "2001:db8::/32", ...]
//!     → compiler.rs (parse, split by family, skip malformed)
//!     → interval.rs (prefix → [start, end], sort + merge)
//!     → table.rs (frozen RangeTable<u32> / RangeTable<u128>)
//!
//! Per request:
//!     IpAddr → CompiledRanges::contains
//!     → family dispatch → binary search in one table
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; reload builds new ones
//! - No cross-family matching (no IPv4-mapped normalization)
//! - Network literals are not realigned to their prefix

pub mod compiler;
pub mod interval;
pub mod table;

pub use compiler::{compile, CompiledRanges};
pub use interval::{merge_intervals, AddressBits, Interval};
pub use table::{Ipv4Table, Ipv6Table, RangeTable};
