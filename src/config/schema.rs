//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::resource::DEFAULT_PADDING_TARGET;

/// Root configuration for the resource service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Timeouts and TLS roots for the HTTP transport.
    pub transport: TransportConfig,

    /// Retry pacing.
    pub retries: RetryConfig,

    /// Body and header padding.
    pub padding: PaddingConfig,

    /// Response cache persistence.
    pub cache: CacheConfig,

    /// Certificate pins by pinning key.
    pub pinning: PinningConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Per-attempt timeout (request and response) in seconds.
    pub request_timeout_secs: u64,

    /// User-Agent header value.
    pub user_agent: String,

    /// Extra trust anchors (PEM files) added to the bundled web roots.
    pub extra_root_certificates: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            user_agent: concat!("resource-service/", env!("CARGO_PKG_VERSION")).to_string(),
            extra_root_certificates: Vec::new(),
        }
    }
}

/// Retry configuration.
///
/// The retry count itself belongs to each resource; this only controls the
/// pause between attempts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Sleep with exponential backoff between attempts. Off means immediate
    /// re-dispatch.
    pub backoff_enabled: bool,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_enabled: false,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Padding configuration for traffic-analysis resistance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaddingConfig {
    /// Bytes that padded bodies are filled up to.
    pub body_target_size: usize,

    /// Bytes that the summed header names and values are filled up to.
    pub header_target_size: usize,

    /// Header carrying "0" for real and "1" for fake requests.
    pub fake_header: String,

    /// Header carrying the random header filler.
    pub padding_header: String,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            body_target_size: DEFAULT_PADDING_TARGET,
            header_target_size: 250,
            fake_header: "x-fake-request".to_string(),
            padding_header: "x-header-padding".to_string(),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file the cache is loaded from and saved to.
    pub persistence_path: Option<String>,
}

/// Public-key pins.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PinningConfig {
    /// Pinning key → hex SHA-256 digests of accepted SubjectPublicKeyInfo.
    pub pins: BTreeMap<String, Vec<String>>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.padding.body_target_size, 250);
        assert!(!config.retries.backoff_enabled);
        assert_eq!(config.transport.request_timeout_secs, 30);
        assert!(config.pinning.pins.is_empty());
    }

    #[test]
    fn test_partial_toml() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [transport]
            request_timeout_secs = 10

            [pinning.pins]
            submission = ["00ff"]
            "#,
        )
        .unwrap();
        assert_eq!(config.transport.request_timeout_secs, 10);
        assert_eq!(config.transport.connect_timeout_secs, 5);
        assert_eq!(config.pinning.pins["submission"], vec!["00ff".to_string()]);
        assert_eq!(config.padding.fake_header, "x-fake-request");
    }
}
