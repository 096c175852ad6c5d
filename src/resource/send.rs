//! Outgoing payload encoders.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::error::ResourceError;

/// Default size, in bytes, that padded request bodies are filled up to.
pub const DEFAULT_PADDING_TARGET: usize = 250;

/// Top-level JSON field that carries the filler.
pub const PADDING_FIELD: &str = "requestPadding";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Encodes the request body of a resource.
pub trait SendResource: Send + Sync {
    /// Content type of the encoded body, if there is one.
    fn content_type(&self) -> Option<&'static str>;

    /// Encode the payload. `padding_target` is the body envelope for
    /// encoders that pad; others ignore it.
    fn encode(&self, padding_target: usize) -> Result<Option<Vec<u8>>, ResourceError>;

    /// Body for a plausible-deniability request. Padding encoders replace
    /// the payload with filler of the same envelope.
    fn encode_fake(&self, padding_target: usize) -> Result<Option<Vec<u8>>, ResourceError> {
        self.encode(padding_target)
    }
}

/// No request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySendResource;

impl SendResource for EmptySendResource {
    fn content_type(&self) -> Option<&'static str> {
        None
    }

    fn encode(&self, _padding_target: usize) -> Result<Option<Vec<u8>>, ResourceError> {
        Ok(None)
    }
}

/// Plain JSON body.
#[derive(Debug, Clone)]
pub struct JsonSendResource<T> {
    model: T,
}

impl<T> JsonSendResource<T> {
    pub fn new(model: T) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &T {
        &self.model
    }
}

impl<T: Serialize + Send + Sync> SendResource for JsonSendResource<T> {
    fn content_type(&self) -> Option<&'static str> {
        Some(JSON_CONTENT_TYPE)
    }

    fn encode(&self, _padding_target: usize) -> Result<Option<Vec<u8>>, ResourceError> {
        serde_json::to_vec(&self.model)
            .map(Some)
            .map_err(|e| ResourceError::Encoding(e.to_string()))
    }
}

/// JSON body with a random `requestPadding` field.
///
/// The filler is sized so the encoded body reaches `padding_target` bytes;
/// payloads already larger than the target get an empty filler. Only the
/// length is deterministic, the characters are random per call.
#[derive(Debug, Clone)]
pub struct PaddingJsonSendResource<T> {
    model: T,
}

impl<T> PaddingJsonSendResource<T> {
    pub fn new(model: T) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &T {
        &self.model
    }
}

impl<T: Serialize + Send + Sync> SendResource for PaddingJsonSendResource<T> {
    fn content_type(&self) -> Option<&'static str> {
        Some(JSON_CONTENT_TYPE)
    }

    fn encode(&self, padding_target: usize) -> Result<Option<Vec<u8>>, ResourceError> {
        let value =
            serde_json::to_value(&self.model).map_err(|e| ResourceError::Encoding(e.to_string()))?;
        match value {
            Value::Object(fields) => pad_object(fields, padding_target).map(Some),
            _ => Err(ResourceError::InvalidPayloadShape),
        }
    }

    fn encode_fake(&self, padding_target: usize) -> Result<Option<Vec<u8>>, ResourceError> {
        pad_object(serde_json::Map::new(), padding_target).map(Some)
    }
}

fn pad_object(
    mut fields: serde_json::Map<String, Value>,
    padding_target: usize,
) -> Result<Vec<u8>, ResourceError> {
    fields.insert(PADDING_FIELD.to_string(), Value::String(String::new()));
    let base = serde_json::to_vec(&fields).map_err(|e| ResourceError::Encoding(e.to_string()))?;

    let filler_len = padding_target.saturating_sub(base.len());
    fields.insert(
        PADDING_FIELD.to_string(),
        Value::String(random_filler(filler_len)),
    );
    serde_json::to_vec(&fields).map_err(|e| ResourceError::Encoding(e.to_string()))
}

/// Random alphanumeric string of exactly `len` bytes.
pub(crate) fn random_filler(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
