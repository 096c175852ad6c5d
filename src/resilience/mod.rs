//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt dispatched by the engine:
//!     → timeouts.rs (bound the attempt by the request timeout)
//!     → classification: transient? (5xx, transport failure)
//!     → retries.rs (consume one unit of the resource's retry budget,
//!       optional exponential delay before re-dispatch)
//! ```
//!
//! # Design Decisions
//! - Budget is per load call; nothing is shared across calls
//! - Immediate re-dispatch unless backoff is switched on in config
//! - A timed-out attempt is a transport failure like any other

pub mod retries;
pub mod timeouts;

pub use retries::RetryBudget;
pub use timeouts::with_timeout;
