//! Request construction.
//!
//! # Responsibilities
//! - Turn a `Resource` into a transport-level `HttpRequest`
//! - Attach the conditional `if-none-match` header for cached entries
//! - Pad bodies and headers so request size does not reveal content
//!
//! Building is pure: no I/O, no shared state. Only lengths are
//! deterministic; filler characters are random per call.

use url::Url;

use crate::config::PaddingConfig;
use crate::error::ResourceError;
use crate::resource::send::random_filler;
use crate::resource::{HttpMethod, ReceiveResource, Resource, SendResource};

pub const CONTENT_TYPE: &str = "content-type";
pub const IF_NONE_MATCH: &str = "if-none-match";

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Summed byte length of all header names and values.
    pub fn header_bytes(&self) -> usize {
        header_bytes(&self.headers)
    }
}

fn header_bytes(headers: &[(String, String)]) -> usize {
    headers.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Builds wire requests from resources.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    padding: PaddingConfig,
}

impl RequestBuilder {
    pub fn new(padding: PaddingConfig) -> Self {
        Self { padding }
    }

    pub fn padding(&self) -> &PaddingConfig {
        &self.padding
    }

    /// Build the request for `resource`, revalidating against `etag` if given.
    pub fn build<S, R, E>(
        &self,
        resource: &Resource<S, R, E>,
        etag: Option<&str>,
    ) -> Result<HttpRequest, ResourceError>
    where
        S: SendResource,
        R: ReceiveResource,
    {
        let locator = &resource.locator;
        let target = self.padding.body_target_size;

        let body = if locator.is_fake() {
            resource.send.encode_fake(target)?
        } else {
            resource.send.encode(target)?
        };
        if locator.method().requires_body() && body.is_none() {
            return Err(ResourceError::MissingRequiredInput("request body"));
        }

        let mut headers: Vec<(String, String)> = locator.default_headers().to_vec();
        if let (Some(_), Some(content_type)) = (&body, resource.send.content_type()) {
            headers.push((CONTENT_TYPE.to_string(), content_type.to_string()));
        }
        if let Some(etag) = etag {
            headers.push((IF_NONE_MATCH.to_string(), etag.to_string()));
        }
        let fake_flag = if locator.is_fake() { "1" } else { "0" };
        headers.push((self.padding.fake_header.clone(), fake_flag.to_string()));

        let used = header_bytes(&headers) + self.padding.padding_header.len();
        let filler = self.padding.header_target_size.saturating_sub(used);
        headers.push((self.padding.padding_header.clone(), random_filler(filler)));

        Ok(HttpRequest {
            method: locator.method(),
            url: locator.endpoint().clone(),
            headers,
            body,
        })
    }
}
