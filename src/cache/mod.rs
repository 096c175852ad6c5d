//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Caching resource load:
//!     → lookup(locator) before dispatch (ETag → if-none-match)
//!     → 200: store(locator, body, etag, now)
//!     → 304: re-serve the stored body, no write
//!     → final failure: stored body as fallback
//! ```
//!
//! # Design Decisions
//! - Injected into the engine, never global
//! - No expiry; eviction is up to the owner of the store
//! - Fake requests never read or write it

pub mod store;

pub use store::{now_secs, CacheEntry, CacheStore, ResponseCache};
