//! Error taxonomy for resource loading.
//!
//! # Retry Classes
//! Decided by `Classification::is_transient` on each attempt.
//! ```text
//! Transport (timeout, connect, body)   → retried
//! UnexpectedServerError(5xx)           → retried
//! UnexpectedServerError(other)         → fatal
//! Custom(E)                            → fatal (resource-specific 4xx)
//! Resource(Decoding/MissingData)       → fatal
//! NotModifiedWithoutCache              → fatal
//! TrustEvaluation                      → fatal, never masked by fallbacks
//! ```

use std::convert::Infallible;
use thiserror::Error;

/// Failures raised while encoding or decoding a resource payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The response carried no body but the receive side requires one.
    #[error("response body is missing")]
    MissingData,

    /// The response body does not match the expected model.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// The outgoing model could not be serialized.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// The request is missing something it cannot be sent without.
    #[error("missing required input: {0}")]
    MissingRequiredInput(&'static str),

    /// Padding was requested for a payload that is not a JSON object.
    #[error("padded payloads must encode to a JSON object")]
    InvalidPayloadShape,
}

/// Reasons a server certificate chain was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    /// No presented certificate matched the pins for this key.
    #[error("no certificate matched the pins for '{pinning_key}'")]
    PinMismatch { pinning_key: String },

    /// The evaluator has no pins for the locator's pinning key.
    #[error("no pins configured for '{0}'")]
    NoPinsConfigured(String),

    /// A presented certificate could not be parsed.
    #[error("certificate could not be parsed: {0}")]
    CertificateParse(String),

    /// The chain failed standard path validation.
    #[error("certificate rejected: {0}")]
    Rejected(String),
}

/// Transport-level failure categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Body,
    TrustRejected(TrustError),
    Other,
}

/// A failed network round trip, with no HTTP response available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure ({kind:?}): {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(after_secs: u64) -> Self {
        Self::new(
            TransportErrorKind::Timeout,
            format!("no response within {after_secs}s"),
        )
    }

    pub fn trust_rejected(error: TrustError) -> Self {
        let message = error.to_string();
        Self::new(TransportErrorKind::TrustRejected(error), message)
    }
}

/// Errors delivered to callers of `Service::load`.
///
/// `E` is the resource-defined error decoded from 4xx bodies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError<E = Infallible>
where
    E: std::error::Error + 'static,
{
    /// Network-level failure after the retry budget was spent.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The response body could not be turned into the receive model.
    #[error("resource error: {0}")]
    Resource(ResourceError),

    /// The request could not be built from the resource.
    #[error("invalid request: {0}")]
    InvalidRequest(ResourceError),

    /// The resource interpreted a client error body.
    #[error("resource-specific error: {0}")]
    Custom(E),

    /// Non-success status code without a more specific interpretation.
    #[error("unexpected server error: HTTP {0}")]
    UnexpectedServerError(u16),

    /// The server certificate chain was refused during the handshake.
    #[error("trust evaluation failed: {0}")]
    TrustEvaluation(TrustError),

    /// `304 Not Modified` arrived although nothing is cached for the locator.
    #[error("received 304 Not Modified without a cached entry")]
    NotModifiedWithoutCache,
}

impl<E> ServiceError<E>
where
    E: std::error::Error + 'static,
{
    pub fn is_trust_failure(&self) -> bool {
        matches!(self, ServiceError::TrustEvaluation(_))
    }
}

impl<E> From<TransportError> for ServiceError<E>
where
    E: std::error::Error + 'static,
{
    fn from(error: TransportError) -> Self {
        match error.kind {
            TransportErrorKind::TrustRejected(trust) => ServiceError::TrustEvaluation(trust),
            _ => ServiceError::Transport(error),
        }
    }
}
