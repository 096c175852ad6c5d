//! Request endpoint identity.

use std::fmt;
use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Methods that must carry a request body.
    pub fn requires_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a logical request.
///
/// Identity is the normalized endpoint plus the method; the same identity is
/// used as the cache key. `is_fake` and `pinning_key` do not take part in it.
#[derive(Debug, Clone)]
pub struct Locator {
    endpoint: Url,
    method: HttpMethod,
    is_fake: bool,
    pinning_key: String,
    default_headers: Vec<(String, String)>,
}

impl Locator {
    pub fn new(endpoint: Url, method: HttpMethod, pinning_key: impl Into<String>) -> Self {
        Self {
            endpoint: normalize(endpoint),
            method,
            is_fake: false,
            pinning_key: pinning_key.into(),
            default_headers: Vec::new(),
        }
    }

    /// Parse `endpoint` and build a GET locator.
    pub fn get(endpoint: &str, pinning_key: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(endpoint)?, HttpMethod::Get, pinning_key))
    }

    /// Parse `endpoint` and build a POST locator.
    pub fn post(endpoint: &str, pinning_key: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(endpoint)?, HttpMethod::Post, pinning_key))
    }

    /// Add a header sent with every request to this locator.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The same locator, marked as a plausible-deniability request.
    pub fn as_fake(&self) -> Self {
        Self {
            is_fake: true,
            ..self.clone()
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn is_fake(&self) -> bool {
        self.is_fake
    }

    pub fn pinning_key(&self) -> &str {
        &self.pinning_key
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    /// Normalized identity string, e.g. `GET https://example.com/v1/config`.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.endpoint)
    }
}

impl PartialEq for Locator {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.endpoint == other.endpoint
    }
}

impl Eq for Locator {}

impl std::hash::Hash for Locator {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.endpoint.as_str().hash(state);
    }
}

/// Drop fragments and trailing slashes so equivalent endpoints share a key.
/// Scheme and host are already lowercased by `Url::parse`.
fn normalize(mut endpoint: Url) -> Url {
    endpoint.set_fragment(None);
    let trimmed = endpoint.path().trim_end_matches('/').to_string();
    if trimmed.is_empty() {
        endpoint.set_path("/");
    } else {
        endpoint.set_path(&trimmed);
    }
    if endpoint.query() == Some("") {
        endpoint.set_query(None);
    }
    endpoint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        let a = Locator::get("HTTPS://Example.com/v1/config/#frag", "api").unwrap();
        let b = Locator::get("https://example.com/v1/config", "api").unwrap();
        assert_eq!(a.key(), "GET https://example.com/v1/config");
        assert_eq!(a, b);
    }

    #[test]
    fn test_method_is_part_of_identity() {
        let get = Locator::get("https://example.com/tan", "api").unwrap();
        let post = Locator::post("https://example.com/tan", "api").unwrap();
        assert_ne!(get, post);
        assert_ne!(get.key(), post.key());
    }

    #[test]
    fn test_fake_keeps_identity() {
        let real = Locator::post("https://example.com/submit", "submission").unwrap();
        let fake = real.as_fake();
        assert!(fake.is_fake());
        assert!(!real.is_fake());
        assert_eq!(real, fake);
        assert_eq!(fake.pinning_key(), "submission");
    }

    #[test]
    fn test_root_path() {
        let locator = Locator::get("https://example.com", "api").unwrap();
        assert_eq!(locator.endpoint().as_str(), "https://example.com/");
    }
}
