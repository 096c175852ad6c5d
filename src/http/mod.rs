//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Resource
//!     → request.rs (method, url, headers, padded body)
//!     → [net::transport performs the round trip]
//!     → response.rs (status → Classification)
//!     → [service::engine acts on the classification]
//! ```

pub mod request;
pub mod response;

pub use request::{HttpRequest, RequestBuilder, CONTENT_TYPE, IF_NONE_MATCH};
pub use response::{classify, classify_status, Classification, HttpResponse, ETAG};
