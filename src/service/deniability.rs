//! Fake-request scheduling for sensitive submissions.
//!
//! Every submission goes out as a pair: a fake copy of the resource first,
//! then the real one. Both carry the same header names, the same body
//! envelope and the same method, so an observer sees the same shape whether
//! or not the user had anything to submit.

use std::sync::Arc;

use crate::error::ServiceError;
use crate::observability::metrics;
use crate::resource::{ReceiveResource, Resource, SendResource};
use crate::service::engine::Service;

/// Wraps a [`Service`] and pairs each submission with a decoy.
#[derive(Clone)]
pub struct PlausibleDeniability {
    service: Arc<Service>,
}

impl PlausibleDeniability {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }

    /// Send a fake copy, then the real resource. Only the real result is
    /// returned; the fake's outcome is logged and dropped.
    pub async fn submit<S, R, E>(&self, resource: &Resource<S, R, E>) -> Result<R::Model, ServiceError<E>>
    where
        S: SendResource + Clone,
        R: ReceiveResource + Clone,
        R::Model: Clone,
        E: std::error::Error + 'static,
    {
        self.send_fake(&resource.fake()).await;
        self.service.load(resource).await
    }

    /// Nothing real to send: emit the same number of requests, all fake.
    pub async fn submit_empty<S, R, E>(&self, resource: &Resource<S, R, E>)
    where
        S: SendResource + Clone,
        R: ReceiveResource + Clone,
        R::Model: Clone,
        E: std::error::Error + 'static,
    {
        let fake = resource.fake();
        self.send_fake(&fake).await;
        self.send_fake(&fake).await;
    }

    async fn send_fake<S, R, E>(&self, fake: &Resource<S, R, E>)
    where
        S: SendResource,
        R: ReceiveResource,
        R::Model: Clone,
        E: std::error::Error + 'static,
    {
        match self.service.load(fake).await {
            Ok(_) => metrics::record_fake(metrics::OUTCOME_OK),
            Err(error) => {
                metrics::record_fake(metrics::OUTCOME_ERROR);
                tracing::debug!(error = %error, "Fake request failed");
            }
        }
    }
}
