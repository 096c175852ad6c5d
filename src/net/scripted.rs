//! In-memory transport that replays scripted outcomes.
//!
//! Used to drive the engine without sockets. Every dispatched request is
//! recorded; an optional certificate chain is run through the resource's
//! trust evaluation before each response, the way a handshake would.

use rustls::pki_types::CertificateDer;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::net::transport::{Transport, TransportFuture, TrustContext};

pub type ScriptedOutcome = Result<HttpResponse, TransportError>;

/// Scripted transport. Queued outcomes are served in order and the last one
/// repeats once the queue is drained.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<ScriptedOutcome>>,
    last: Mutex<Option<ScriptedOutcome>>,
    requests: Mutex<Vec<HttpRequest>>,
    chain: Vec<CertificateDer<'static>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn sequence(outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        Self {
            steps: Mutex::new(outcomes.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            chain: Vec::new(),
            delay: None,
        }
    }

    /// Always answer with `response`.
    pub fn always(response: HttpResponse) -> Self {
        Self::sequence([Ok(response)])
    }

    /// Present this chain to the trust evaluation on every dispatch.
    pub fn with_certificate_chain(mut self, chain: Vec<CertificateDer<'static>>) -> Self {
        self.chain = chain;
        self
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn dispatch_count(&self) -> usize {
        self.requests.lock().expect("scripted transport mutex poisoned").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("scripted transport mutex poisoned").clone()
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        let mut last = self.last.lock().expect("scripted transport mutex poisoned");
        match self.steps.lock().expect("scripted transport mutex poisoned").pop_front() {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last
                .clone()
                .unwrap_or_else(|| Ok(HttpResponse::new(500, Vec::new()))),
        }
    }
}

impl Transport for ScriptedTransport {
    fn perform<'a>(&'a self, request: HttpRequest, trust: &'a TrustContext) -> TransportFuture<'a> {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("scripted transport mutex poisoned")
                .push(request);

            if !self.chain.is_empty() {
                trust
                    .evaluation
                    .evaluate(&trust.pinning_key, &self.chain)
                    .map_err(TransportError::trust_rejected)?;
            }

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.next_outcome()
        })
    }
}
