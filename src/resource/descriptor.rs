//! Resource descriptors.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use crate::net::trust::{DisabledTrustEvaluation, TrustEvaluation};
use crate::resource::locator::Locator;
use crate::resource::receive::ReceiveResource;

/// Whether a resource goes through the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceType<M> {
    /// Revalidate with ETags and fall back to cached data or `default_model`.
    Caching { default_model: Option<M> },
    /// Always a full network round trip.
    Unique,
}

impl<M> ServiceType<M> {
    pub fn is_caching(&self) -> bool {
        matches!(self, ServiceType::Caching { .. })
    }

    pub fn default_model(&self) -> Option<&M> {
        match self {
            ServiceType::Caching { default_model } => default_model.as_ref(),
            ServiceType::Unique => None,
        }
    }
}

/// Interprets a client-error body as a resource-specific error.
pub type CustomErrorDecoder<E> = Arc<dyn Fn(u16, Option<&[u8]>) -> Option<E> + Send + Sync>;

/// Everything needed to load one resource: where, how to encode, how to
/// decode, and the cache, retry and trust policy.
pub struct Resource<S, R, E = Infallible>
where
    R: ReceiveResource,
{
    pub locator: Locator,
    pub service_type: ServiceType<R::Model>,
    pub send: S,
    pub receive: R,
    /// Additional attempts after the first.
    pub retrying_count: u32,
    pub trust_evaluation: Arc<dyn TrustEvaluation>,
    custom_error: Option<CustomErrorDecoder<E>>,
}

impl<S, R> Resource<S, R, Infallible>
where
    R: ReceiveResource,
{
    /// A unique, non-retrying resource with system trust only.
    pub fn new(locator: Locator, send: S, receive: R) -> Self {
        Self {
            locator,
            service_type: ServiceType::Unique,
            send,
            receive,
            retrying_count: 0,
            trust_evaluation: Arc::new(DisabledTrustEvaluation),
            custom_error: None,
        }
    }
}

impl<S, R, E> Resource<S, R, E>
where
    R: ReceiveResource,
{
    pub fn caching(mut self) -> Self {
        self.service_type = ServiceType::Caching {
            default_model: None,
        };
        self
    }

    pub fn caching_with_default(mut self, default_model: R::Model) -> Self {
        self.service_type = ServiceType::Caching {
            default_model: Some(default_model),
        };
        self
    }

    pub fn retrying(mut self, retrying_count: u32) -> Self {
        self.retrying_count = retrying_count;
        self
    }

    pub fn trust(mut self, evaluation: Arc<dyn TrustEvaluation>) -> Self {
        self.trust_evaluation = evaluation;
        self
    }

    /// Install a decoder for 4xx bodies, changing the resource error type.
    pub fn custom_errors<E2, F>(self, decoder: F) -> Resource<S, R, E2>
    where
        F: Fn(u16, Option<&[u8]>) -> Option<E2> + Send + Sync + 'static,
    {
        Resource {
            locator: self.locator,
            service_type: self.service_type,
            send: self.send,
            receive: self.receive,
            retrying_count: self.retrying_count,
            trust_evaluation: self.trust_evaluation,
            custom_error: Some(Arc::new(decoder)),
        }
    }

    pub fn custom_error(&self, status: u16, body: Option<&[u8]>) -> Option<E> {
        self.custom_error
            .as_ref()
            .and_then(|decode| decode(status, body))
    }

    /// A structurally identical request flagged as fake. Fakes never use the
    /// cache, so the copy is always `Unique`.
    pub fn fake(&self) -> Self
    where
        S: Clone,
        R: Clone,
    {
        Self {
            locator: self.locator.as_fake(),
            service_type: ServiceType::Unique,
            send: self.send.clone(),
            receive: self.receive.clone(),
            retrying_count: self.retrying_count,
            trust_evaluation: Arc::clone(&self.trust_evaluation),
            custom_error: self.custom_error.clone(),
        }
    }
}

impl<S, R, E> fmt::Debug for Resource<S, R, E>
where
    R: ReceiveResource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("locator", &self.locator.key())
            .field("is_fake", &self.locator.is_fake())
            .field("caching", &self.service_type.is_caching())
            .field("retrying_count", &self.retrying_count)
            .field("trust_evaluation", &self.trust_evaluation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::receive::JsonReceiveResource;
    use crate::resource::send::EmptySendResource;

    fn resource() -> Resource<EmptySendResource, JsonReceiveResource<String>> {
        let locator = Locator::get("https://example.com/config", "api").unwrap();
        Resource::new(locator, EmptySendResource, JsonReceiveResource::new())
    }

    #[test]
    fn test_defaults() {
        let resource = resource();
        assert_eq!(resource.service_type, ServiceType::Unique);
        assert_eq!(resource.retrying_count, 0);
        assert!(resource.custom_error(400, None).is_none());
    }

    #[test]
    fn test_builder() {
        let resource = resource().caching_with_default("fallback".to_string()).retrying(3);
        assert!(resource.service_type.is_caching());
        assert_eq!(resource.service_type.default_model().unwrap(), "fallback");
        assert_eq!(resource.retrying_count, 3);
    }

    #[test]
    fn test_custom_error_decoder() {
        #[derive(Debug, PartialEq)]
        struct TanAlreadyUsed;

        let resource = resource().custom_errors(|status, _body| {
            (status == 409).then_some(TanAlreadyUsed)
        });
        assert_eq!(resource.custom_error(409, None), Some(TanAlreadyUsed));
        assert_eq!(resource.custom_error(400, None), None);
    }

    #[test]
    fn test_fake_copy_is_unique() {
        let resource = resource().caching().retrying(2);
        let fake = resource.fake();
        assert!(fake.locator.is_fake());
        assert_eq!(fake.service_type, ServiceType::Unique);
        assert_eq!(fake.retrying_count, 2);
    }
}
