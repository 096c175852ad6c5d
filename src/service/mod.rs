//! Resource service subsystem.
//!
//! # Data Flow
//! ```text
//! caller → Service::load(resource) | Service::load_with(resource, completion)
//!     → cache lookup (caching, real locators only)
//!     → http::request build → net::Transport (per-attempt timeout)
//!     → http::response classify → retry / decode / store / fallback
//!
//! caller → PlausibleDeniability::submit(resource)
//!     → fake copy through the engine (result discarded)
//!     → real resource through the engine (result returned)
//! ```
//!
//! # Design Decisions
//! - Transport and cache are injected trait objects
//! - The engine never blocks the caller; all waiting is async

pub mod deniability;
pub mod engine;

pub use deniability::PlausibleDeniability;
pub use engine::Service;
