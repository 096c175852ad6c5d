//! Response representation and classification.
//!
//! # Status Mapping
//! ```text
//! 2xx          → Success
//! 304          → NotModified
//! 400..=499    → ClientError
//! 500..=599    → ServerError
//! other codes  → Unexpected (not retried)
//! no response  → TransportFailure, or TrustFailure for handshake rejection
//! ```

use crate::error::{TransportError, TransportErrorKind, TrustError};

pub const ETAG: &str = "etag";

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn etag(&self) -> Option<&str> {
        self.header(ETAG).filter(|tag| !tag.is_empty())
    }

    /// The body, or `None` when it is empty.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        (!self.body.is_empty()).then_some(self.body.as_slice())
    }
}

/// Outcome of a single attempt, as seen by the retry engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Success,
    NotModified,
    ClientError(u16),
    ServerError(u16),
    Unexpected(u16),
    TransportFailure(TransportError),
    TrustFailure(TrustError),
}

impl Classification {
    /// Server errors and transport failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Classification::ServerError(_) | Classification::TransportFailure(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Success => "success",
            Classification::NotModified => "not_modified",
            Classification::ClientError(_) => "client_error",
            Classification::ServerError(_) => "server_error",
            Classification::Unexpected(_) => "unexpected",
            Classification::TransportFailure(_) => "transport_failure",
            Classification::TrustFailure(_) => "trust_failure",
        }
    }
}

/// Map a raw attempt outcome to its classification.
pub fn classify(outcome: &Result<HttpResponse, TransportError>) -> Classification {
    match outcome {
        Ok(response) => classify_status(response.status),
        Err(error) => match &error.kind {
            TransportErrorKind::TrustRejected(trust) => Classification::TrustFailure(trust.clone()),
            _ => Classification::TransportFailure(error.clone()),
        },
    }
}

pub fn classify_status(status: u16) -> Classification {
    match status {
        // Not only 200: submissions are answered with 201 or 204. Whether an
        // empty body is acceptable is up to the receive decoder.
        200..=299 => Classification::Success,
        304 => Classification::NotModified,
        400..=499 => Classification::ClientError(status),
        500..=599 => Classification::ServerError(status),
        _ => Classification::Unexpected(status),
    }
}
