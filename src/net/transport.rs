//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Perform one network round trip per call (no retries here)
//! - Install the resource's trust evaluation into the TLS handshake
//! - Map client errors onto `TransportError` kinds
//!
//! # Design Decisions
//! - One reqwest client per (trust policy, pinning key), built lazily and
//!   shared across calls
//! - Non-success statuses are not errors at this layer; classification
//!   happens in `http::response`

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use rustls::RootCertStore;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigError, TransportConfig};
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpRequest, HttpResponse};
use crate::net::tls::{client_config, load_root_store, trust_error_in};
use crate::net::trust::TrustEvaluation;
use crate::resource::HttpMethod;

/// Trust policy applied to one dispatch.
#[derive(Debug, Clone)]
pub struct TrustContext {
    pub evaluation: Arc<dyn TrustEvaluation>,
    pub pinning_key: String,
}

pub type TransportFuture<'a> = BoxFuture<'a, Result<HttpResponse, TransportError>>;

/// An HTTP client capability: one request in, one response or error out.
pub trait Transport: Send + Sync {
    fn perform<'a>(&'a self, request: HttpRequest, trust: &'a TrustContext) -> TransportFuture<'a>;
}

/// reqwest-backed transport over rustls.
pub struct HttpTransport {
    config: TransportConfig,
    roots: Arc<RootCertStore>,
    clients: DashMap<String, reqwest::Client>,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, ConfigError> {
        let roots = Arc::new(load_root_store(&config.extra_root_certificates)?);
        tracing::debug!(roots = roots.len(), "HTTP transport initialized");
        Ok(Self {
            config,
            roots,
            clients: DashMap::new(),
        })
    }

    fn client_for(&self, trust: &TrustContext) -> Result<reqwest::Client, TransportError> {
        let key = format!("{}|{}", trust.evaluation.policy_id(), trust.pinning_key);
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.value().clone());
        }

        let tls = client_config(
            Arc::clone(&self.roots),
            Arc::clone(&trust.evaluation),
            &trust.pinning_key,
        )
        .map_err(|e| TransportError::new(TransportErrorKind::Other, e.to_string()))?;

        let client = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .user_agent(self.config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::new(TransportErrorKind::Other, e.to_string()))?;

        tracing::debug!(policy = %key, "Built HTTP client for trust policy");
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    async fn send(&self, request: HttpRequest, trust: &TrustContext) -> Result<HttpResponse, TransportError> {
        let client = self.client_for(trust)?;

        let mut builder = client.request(to_reqwest_method(request.method), request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(map_error)?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn perform<'a>(&'a self, request: HttpRequest, trust: &'a TrustContext) -> TransportFuture<'a> {
        Box::pin(self.send(request, trust))
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

fn map_error(error: reqwest::Error) -> TransportError {
    if let Some(trust) = trust_error_in(&error) {
        return TransportError::trust_rejected(trust);
    }
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() || error.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, error.to_string())
}
