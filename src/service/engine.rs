//! Resource loading engine.
//!
//! # States
//! ```text
//! Idle → Dispatching → AwaitingResponse → Classifying
//!     → Succeeded
//!     → Retrying → Dispatching        (5xx / transport failure, budget left)
//!     → FailedFinal → fallback?        (cache entry, then default model)
//! ```
//!
//! # Design Decisions
//! - One independent state machine per `load`; concurrent loads of the same
//!   locator are not merged and the last cache write wins
//! - Attempt N+1 is dispatched only after attempt N is classified
//! - Trust failures skip both retry and fallback

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::cache::{now_secs, CacheEntry, CacheStore};
use crate::config::{RetryConfig, ServiceConfig};
use crate::error::ServiceError;
use crate::http::{classify, Classification, HttpResponse, RequestBuilder};
use crate::net::{Transport, TrustContext};
use crate::observability::metrics;
use crate::resilience::{with_timeout, RetryBudget};
use crate::resource::{ReceiveResource, Resource, SendResource};

/// Executes resources against a transport and a cache.
pub struct Service {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheStore>,
    builder: RequestBuilder,
    retries: RetryConfig,
    request_timeout: Duration,
}

impl Service {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CacheStore>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            builder: RequestBuilder::new(config.padding.clone()),
            retries: config.retries.clone(),
            request_timeout: Duration::from_secs(config.transport.request_timeout_secs),
        }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn request_builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Load `resource`, retrying transient failures and applying the cache
    /// policy of its service type.
    pub async fn load<S, R, E>(&self, resource: &Resource<S, R, E>) -> Result<R::Model, ServiceError<E>>
    where
        S: SendResource,
        R: ReceiveResource,
        R::Model: Clone,
        E: std::error::Error + 'static,
    {
        let locator = &resource.locator;
        let span = tracing::info_span!(
            "resource_load",
            request_id = %Uuid::new_v4(),
            key = %locator.key(),
            fake = locator.is_fake()
        );

        async move {
            let started = Instant::now();
            let caching = resource.service_type.is_caching() && !locator.is_fake();
            let cached = if caching { self.lookup(resource) } else { None };

            let (result, outcome) = match self.execute(resource, cached.as_ref(), caching).await {
                Ok(model) => (Ok(model), metrics::OUTCOME_OK),
                Err(error) if caching && !error.is_trust_failure() => {
                    match self.fallback(resource, cached.as_ref(), error) {
                        Ok(model) => (Ok(model), metrics::OUTCOME_FALLBACK),
                        Err(error) => (Err(error), metrics::OUTCOME_ERROR),
                    }
                }
                Err(error) => (Err(error), metrics::OUTCOME_ERROR),
            };
            metrics::record_load(outcome, started.elapsed());
            if let Err(error) = &result {
                tracing::warn!(error = %error, "Resource load failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Callback form of [`Service::load`]. The load runs on the tokio runtime
    /// and `completion` is invoked exactly once, even if the caller drops the
    /// returned handle.
    pub fn load_with<S, R, E, F>(
        self: &Arc<Self>,
        resource: Arc<Resource<S, R, E>>,
        completion: F,
    ) -> tokio::task::JoinHandle<()>
    where
        S: SendResource + 'static,
        R: ReceiveResource + 'static,
        R::Model: Clone + Sync,
        E: std::error::Error + Send + Sync + 'static,
        F: FnOnce(Result<R::Model, ServiceError<E>>) + Send + 'static,
    {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let result = service.load(&resource).await;
            completion(result);
        })
    }

    fn lookup<S, R, E>(&self, resource: &Resource<S, R, E>) -> Option<CacheEntry>
    where
        R: ReceiveResource,
    {
        let entry = self.cache.lookup(&resource.locator);
        match &entry {
            Some(entry) => {
                metrics::record_cache_event(metrics::CACHE_HIT);
                tracing::debug!(etag = ?entry.etag, stored_at = entry.date, "Cache entry found");
            }
            None => metrics::record_cache_event(metrics::CACHE_MISS),
        }
        entry
    }

    async fn execute<S, R, E>(
        &self,
        resource: &Resource<S, R, E>,
        cached: Option<&CacheEntry>,
        caching: bool,
    ) -> Result<R::Model, ServiceError<E>>
    where
        S: SendResource,
        R: ReceiveResource,
        E: std::error::Error + 'static,
    {
        let etag = cached.and_then(|entry| entry.etag.as_deref());
        let request = self
            .builder
            .build(resource, etag)
            .map_err(ServiceError::InvalidRequest)?;

        let trust = TrustContext {
            evaluation: Arc::clone(&resource.trust_evaluation),
            pinning_key: resource.locator.pinning_key().to_string(),
        };
        let mut budget = RetryBudget::new(resource.retrying_count, &self.retries);

        loop {
            let outcome = with_timeout(
                self.request_timeout,
                self.transport.perform(request.clone(), &trust),
            )
            .await;
            let classification = classify(&outcome);
            metrics::record_dispatch(classification.label());
            tracing::debug!(
                attempt = budget.attempt(),
                outcome = classification.label(),
                "Attempt classified"
            );

            if classification.is_transient() {
                let failure = match outcome {
                    Ok(response) => ServiceError::UnexpectedServerError(response.status),
                    Err(error) => ServiceError::from(error),
                };
                match budget.try_consume() {
                    Some(delay) => {
                        metrics::record_retry();
                        tracing::info!(
                            error = %failure,
                            remaining = budget.remaining(),
                            delay_ms = delay.as_millis() as u64,
                            "Retrying resource"
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        continue;
                    }
                    None => return Err(failure),
                }
            }

            return match (classification, outcome) {
                (Classification::Success, Ok(response)) => self.on_success(resource, response, caching),
                (Classification::NotModified, _) => self.on_not_modified(resource, cached),
                (Classification::ClientError(status), Ok(response)) => Err(resource
                    .custom_error(status, response.body_bytes())
                    .map(ServiceError::Custom)
                    .unwrap_or(ServiceError::UnexpectedServerError(status))),
                (Classification::TrustFailure(error), _) => {
                    tracing::error!(error = %error, pinning_key = %trust.pinning_key, "Server trust evaluation failed");
                    Err(ServiceError::TrustEvaluation(error))
                }
                (_, Ok(response)) => Err(ServiceError::UnexpectedServerError(response.status)),
                (_, Err(error)) => Err(ServiceError::from(error)),
            };
        }
    }

    fn on_success<S, R, E>(
        &self,
        resource: &Resource<S, R, E>,
        response: HttpResponse,
        caching: bool,
    ) -> Result<R::Model, ServiceError<E>>
    where
        R: ReceiveResource,
        E: std::error::Error + 'static,
    {
        let model = resource
            .receive
            .decode(response.body_bytes())
            .map_err(ServiceError::Resource)?;

        if caching {
            let etag = response.etag().map(str::to_string);
            tracing::debug!(etag = ?etag, bytes = response.body.len(), "Storing response");
            self.cache
                .store(&resource.locator, response.body, etag, now_secs());
            metrics::record_cache_event(metrics::CACHE_STORE);
        }
        Ok(model)
    }

    fn on_not_modified<S, R, E>(
        &self,
        resource: &Resource<S, R, E>,
        cached: Option<&CacheEntry>,
    ) -> Result<R::Model, ServiceError<E>>
    where
        R: ReceiveResource,
        E: std::error::Error + 'static,
    {
        let entry = cached.ok_or(ServiceError::NotModifiedWithoutCache)?;
        metrics::record_cache_event(metrics::CACHE_NOT_MODIFIED);
        resource
            .receive
            .decode(entry_body(entry))
            .map_err(ServiceError::Resource)
    }

    fn fallback<S, R, E>(
        &self,
        resource: &Resource<S, R, E>,
        cached: Option<&CacheEntry>,
        error: ServiceError<E>,
    ) -> Result<R::Model, ServiceError<E>>
    where
        R: ReceiveResource,
        R::Model: Clone,
        E: std::error::Error + 'static,
    {
        if let Some(entry) = cached {
            match resource.receive.decode(entry_body(entry)) {
                Ok(model) => {
                    metrics::record_cache_event(metrics::CACHE_FALLBACK);
                    tracing::warn!(error = %error, stored_at = entry.date, "Serving cached data after failure");
                    return Ok(model);
                }
                Err(decode_error) => {
                    tracing::debug!(error = %decode_error, "Cached entry unusable as fallback");
                }
            }
        }

        if let Some(model) = resource.service_type.default_model() {
            tracing::warn!(error = %error, "Serving default model after failure");
            return Ok(model.clone());
        }
        Err(error)
    }
}

fn entry_body(entry: &CacheEntry) -> Option<&[u8]> {
    if entry.data.is_empty() {
        None
    } else {
        Some(entry.data.as_slice())
    }
}
