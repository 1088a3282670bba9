//! HTTP transport adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → middleware/access_control.rs
//!         → request.rs (client address, country, headers)
//!         → decision engine (under cancel token + deadline)
//!             → hostname rules resolve through dns when reached
//!     → Block: 403 / Challenge: pass or reject / Allow: forward
//!     → guarded fallback answers 200 with x-access-decision
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use middleware::X_ACCESS_DECISION;
pub use request::RequestPolicy;
pub use server::{AdapterSettings, AppState, GateServer};
