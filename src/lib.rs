//! HTTP resource loading service.
//!
//! Loads strongly-typed resources over HTTP with ETag revalidation, a
//! per-resource retry budget, certificate pinning and padded decoy requests
//! for privacy-sensitive submissions.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod resource;
pub mod service;

pub use cache::{CacheEntry, CacheStore, ResponseCache};
pub use config::ServiceConfig;
pub use error::{ResourceError, ServiceError, TransportError, TransportErrorKind, TrustError};
pub use resource::{Locator, Resource, ServiceType};
pub use service::{PlausibleDeniability, Service};
