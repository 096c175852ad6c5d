//! Network layer: transport, TLS and trust evaluation.
//!
//! # Data Flow
//! ```text
//! HttpRequest + TrustContext
//!     → transport.rs (reqwest client for the trust policy)
//!     → tls.rs (rustls handshake; web PKI validation, then trust.rs)
//!     → HttpResponse | TransportError
//! ```
//!
//! # Design Decisions
//! - The transport is a trait so the engine can run against scripted.rs
//! - Trust rejections abort the handshake and are reported as their own
//!   transport error kind

pub mod scripted;
pub mod tls;
pub mod transport;
pub mod trust;

pub use scripted::{ScriptedOutcome, ScriptedTransport};
pub use transport::{HttpTransport, Transport, TransportFuture, TrustContext};
pub use trust::{spki_sha256, DisabledTrustEvaluation, PinningTrustEvaluation, TrustEvaluation};
