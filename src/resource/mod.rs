//! Resource descriptors.
//!
//! # Data Flow
//! ```text
//! Locator (endpoint + method, fake flag, pinning key)
//!     → Resource (locator + send + receive + cache/retry/trust policy)
//!     → http::request builds the wire request from it
//!     → service::engine decodes the response through `receive`
//! ```
//!
//! # Design Decisions
//! - Resources are immutable values passed per call, never stored
//! - Send/receive codecs are traits so payload types stay generic
//! - Custom 4xx interpretation is an optional closure on the resource

pub mod descriptor;
pub mod locator;
pub mod receive;
pub mod send;

pub use descriptor::{CustomErrorDecoder, Resource, ServiceType};
pub use locator::{HttpMethod, Locator};
pub use receive::{DataReceiveResource, EmptyReceiveResource, JsonReceiveResource, ReceiveResource};
pub use send::{
    EmptySendResource, JsonSendResource, PaddingJsonSendResource, SendResource,
    DEFAULT_PADDING_TARGET, PADDING_FIELD,
};
