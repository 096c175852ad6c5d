//! Server trust evaluation.
//!
//! # Responsibilities
//! - Decide whether a presented certificate chain is acceptable for a
//!   locator's pinning key
//! - Hash SubjectPublicKeyInfo (SHA-256) for public-key pinning
//!
//! # Design Decisions
//! - Evaluation runs inside the TLS handshake (see `net::tls`), after the
//!   standard web PKI path validation, so a rejection aborts the connection
//!   before any response byte is read
//! - Rejections are never retried and never masked by fallbacks

use rustls::pki_types::CertificateDer;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::config::PinningConfig;
use crate::error::TrustError;

/// Pluggable server trust policy.
pub trait TrustEvaluation: fmt::Debug + Send + Sync {
    /// Accept or reject the chain (end entity first) presented for
    /// `pinning_key`.
    fn evaluate(&self, pinning_key: &str, chain: &[CertificateDer<'_>]) -> Result<(), TrustError>;

    /// Stable identity of the policy; resources sharing it share TLS clients.
    fn policy_id(&self) -> String;
}

/// System trust only. Every chain that passes path validation is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTrustEvaluation;

impl TrustEvaluation for DisabledTrustEvaluation {
    fn evaluate(&self, _pinning_key: &str, _chain: &[CertificateDer<'_>]) -> Result<(), TrustError> {
        Ok(())
    }

    fn policy_id(&self) -> String {
        "system".to_string()
    }
}

/// Accepts a chain only if one of its certificates carries a pinned key.
#[derive(Debug, Clone, Default)]
pub struct PinningTrustEvaluation {
    pins: BTreeMap<String, BTreeSet<[u8; 32]>>,
}

impl PinningTrustEvaluation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin a SHA-256 SPKI digest for `pinning_key`.
    pub fn with_pin(mut self, pinning_key: impl Into<String>, spki_sha256: [u8; 32]) -> Self {
        self.pins
            .entry(pinning_key.into())
            .or_default()
            .insert(spki_sha256);
        self
    }

    /// Build from hex digests as found in the config file.
    pub fn from_config(config: &PinningConfig) -> Result<Self, TrustError> {
        let mut evaluation = Self::new();
        for (key, hashes) in &config.pins {
            for hash in hashes {
                let digest = decode_pin(hash)?;
                evaluation = evaluation.with_pin(key.clone(), digest);
            }
        }
        Ok(evaluation)
    }

    pub fn pinned_keys(&self) -> impl Iterator<Item = &str> {
        self.pins.keys().map(String::as_str)
    }
}

impl TrustEvaluation for PinningTrustEvaluation {
    fn evaluate(&self, pinning_key: &str, chain: &[CertificateDer<'_>]) -> Result<(), TrustError> {
        let allowed = self
            .pins
            .get(pinning_key)
            .filter(|pins| !pins.is_empty())
            .ok_or_else(|| TrustError::NoPinsConfigured(pinning_key.to_string()))?;

        for certificate in chain {
            let digest = spki_sha256(certificate)?;
            if allowed.contains(&digest) {
                return Ok(());
            }
        }

        tracing::warn!(pinning_key, chain_len = chain.len(), "Certificate pin mismatch");
        Err(TrustError::PinMismatch {
            pinning_key: pinning_key.to_string(),
        })
    }

    fn policy_id(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, pins) in &self.pins {
            hasher.update(key.as_bytes());
            for pin in pins {
                hasher.update(pin);
            }
        }
        format!("pinning:{}", hex::encode(hasher.finalize()))
    }
}

/// SHA-256 of the certificate's DER-encoded SubjectPublicKeyInfo.
pub fn spki_sha256(certificate: &CertificateDer<'_>) -> Result<[u8; 32], TrustError> {
    let (_, parsed) = X509Certificate::from_der(certificate.as_ref())
        .map_err(|e| TrustError::CertificateParse(e.to_string()))?;
    Ok(Sha256::digest(parsed.public_key().raw).into())
}

fn decode_pin(hash: &str) -> Result<[u8; 32], TrustError> {
    let bytes = hex::decode(hash).map_err(|e| TrustError::CertificateParse(format!("pin '{hash}': {e}")))?;
    bytes
        .try_into()
        .map_err(|_| TrustError::CertificateParse(format!("pin '{hash}' is not 32 bytes")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PINNED_SPKI: &str =
        "f15b1fdd9c3dd1579d420e310ea870c8d2b1e255456ec72e39ee6b2846233800";

    pub(crate) fn load(pem: &[u8]) -> CertificateDer<'static> {
        let mut reader = std::io::BufReader::new(pem);
        let cert = rustls_pemfile::certs(&mut reader).next().unwrap().unwrap();
        cert
    }

    pub(crate) fn pinned_cert() -> CertificateDer<'static> {
        load(include_bytes!("../../tests/data/pinned.pem"))
    }

    pub(crate) fn other_cert() -> CertificateDer<'static> {
        load(include_bytes!("../../tests/data/other.pem"))
    }

    fn evaluation() -> PinningTrustEvaluation {
        let mut config = PinningConfig::default();
        config.pins.insert("submission".into(), vec![PINNED_SPKI.into()]);
        PinningTrustEvaluation::from_config(&config).unwrap()
    }

    #[test]
    fn test_spki_hash() {
        assert_eq!(hex::encode(spki_sha256(&pinned_cert()).unwrap()), PINNED_SPKI);
    }

    #[test]
    fn test_pin_match_anywhere_in_chain() {
        let evaluation = evaluation();
        assert!(evaluation.evaluate("submission", &[pinned_cert()]).is_ok());
        assert!(evaluation
            .evaluate("submission", &[other_cert(), pinned_cert()])
            .is_ok());
    }

    #[test]
    fn test_pin_mismatch() {
        let err = evaluation().evaluate("submission", &[other_cert()]).unwrap_err();
        assert_eq!(
            err,
            TrustError::PinMismatch {
                pinning_key: "submission".into()
            }
        );
    }

    #[test]
    fn test_unknown_pinning_key() {
        let err = evaluation().evaluate("verification", &[pinned_cert()]).unwrap_err();
        assert_eq!(err, TrustError::NoPinsConfigured("verification".into()));
    }

    #[test]
    fn test_garbage_certificate() {
        let garbage = CertificateDer::from(vec![0u8, 1, 2, 3]);
        let err = evaluation().evaluate("submission", &[garbage]).unwrap_err();
        assert!(matches!(err, TrustError::CertificateParse(_)));
    }

    #[test]
    fn test_disabled_accepts_everything() {
        assert!(DisabledTrustEvaluation.evaluate("any", &[]).is_ok());
    }

    #[test]
    fn test_policy_id_is_stable() {
        assert_eq!(evaluation().policy_id(), evaluation().policy_id());
        assert_ne!(evaluation().policy_id(), PinningTrustEvaluation::new().policy_id());
        assert_eq!(DisabledTrustEvaluation.policy_id(), "system");
    }

    #[test]
    fn test_bad_pin_in_config() {
        let mut config = PinningConfig::default();
        config.pins.insert("api".into(), vec!["abcd".into()]);
        assert!(PinningTrustEvaluation::from_config(&config).is_err());
    }
}
