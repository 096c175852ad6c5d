//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every load:
//!     → span `resource_load` carrying request_id, method, endpoint, fake
//!     → metrics.rs (dispatch outcomes, retries, cache events, latency)
//!     → logging.rs (subscriber installed once by the binary)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or a metrics
//!   recorder is left to the embedding application
//! - Request bodies and header values are never logged

pub mod logging;
pub mod metrics;
