//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown (second one forces exit)
//!     SIGHUP → Reload config file into the update channel
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
