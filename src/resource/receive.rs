//! Response payload decoders.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::error::ResourceError;

/// Decodes a response body into the resource's model.
pub trait ReceiveResource: Send + Sync {
    type Model: Send + 'static;

    /// `body` is `None` when the response carried no bytes.
    fn decode(&self, body: Option<&[u8]>) -> Result<Self::Model, ResourceError>;
}

/// Ignores the body entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyReceiveResource;

impl ReceiveResource for EmptyReceiveResource {
    type Model = ();

    fn decode(&self, _body: Option<&[u8]>) -> Result<(), ResourceError> {
        Ok(())
    }
}

/// Hands back the raw body bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataReceiveResource;

impl ReceiveResource for DataReceiveResource {
    type Model = Vec<u8>;

    fn decode(&self, body: Option<&[u8]>) -> Result<Vec<u8>, ResourceError> {
        body.map(<[u8]>::to_vec).ok_or(ResourceError::MissingData)
    }
}

/// Deserializes a JSON body into `T`. Unknown fields are ignored.
///
/// A missing body is `MissingData` unless `T` accepts `null`, so
/// `JsonReceiveResource<Option<T>>` can read 204 answers.
#[derive(Debug)]
pub struct JsonReceiveResource<T> {
    _model: PhantomData<fn() -> T>,
}

impl<T> JsonReceiveResource<T> {
    pub fn new() -> Self {
        Self {
            _model: PhantomData,
        }
    }
}

impl<T> Default for JsonReceiveResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonReceiveResource<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> ReceiveResource for JsonReceiveResource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Model = T;

    fn decode(&self, body: Option<&[u8]>) -> Result<T, ResourceError> {
        match body {
            Some(body) => {
                serde_json::from_slice(body).map_err(|e| ResourceError::Decoding(e.to_string()))
            }
            // An empty 2xx body reads as JSON null, which only `Option`
            // and unit models accept.
            None => serde_json::from_value(serde_json::Value::Null)
                .map_err(|_| ResourceError::MissingData),
        }
    }
}
