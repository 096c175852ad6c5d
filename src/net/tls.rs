//! TLS client configuration and handshake-time trust hooks.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error as TlsError, OtherError,
    RootCertStore, SignatureScheme,
};
use std::error::Error as StdError;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::config::ConfigError;
use crate::error::TrustError;
use crate::net::trust::TrustEvaluation;

/// Load the bundled web PKI roots plus any extra PEM trust anchors.
pub fn load_root_store(extra_pem_paths: &[String]) -> Result<RootCertStore, ConfigError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    for path in extra_pem_paths {
        let path = Path::new(path);
        if !path.exists() {
            return Err(ConfigError::Certificates(format!(
                "Certificate file not found: {:?}",
                path
            )));
        }
        let mut reader = BufReader::new(File::open(path)?);
        let mut added = 0usize;
        for certificate in rustls_pemfile::certs(&mut reader) {
            roots
                .add(certificate?)
                .map_err(|e| ConfigError::Certificates(format!("{:?}: {}", path, e)))?;
            added += 1;
        }
        tracing::debug!(path = ?path, added, "Loaded extra trust anchors");
    }

    Ok(roots)
}

/// Build a client config whose verifier applies `evaluation` for
/// `pinning_key` after standard path validation.
pub fn client_config(
    roots: Arc<RootCertStore>,
    evaluation: Arc<dyn TrustEvaluation>,
    pinning_key: &str,
) -> Result<ClientConfig, TlsError> {
    let provider = Arc::new(ring::default_provider());
    let inner = WebPkiServerVerifier::builder_with_provider(roots, Arc::clone(&provider))
        .build()
        .map_err(|e| TlsError::General(e.to_string()))?;

    let verifier = Arc::new(EvaluatingVerifier {
        inner,
        evaluation,
        pinning_key: pinning_key.to_string(),
    });

    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

#[derive(Debug)]
struct EvaluatingVerifier {
    inner: Arc<WebPkiServerVerifier>,
    evaluation: Arc<dyn TrustEvaluation>,
    pinning_key: String,
}

impl ServerCertVerifier for EvaluatingVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)?;

        let mut chain = Vec::with_capacity(intermediates.len() + 1);
        chain.push(end_entity.clone());
        chain.extend(intermediates.iter().cloned());

        self.evaluation
            .evaluate(&self.pinning_key, &chain)
            .map_err(|e| TlsError::InvalidCertificate(CertificateError::Other(OtherError(Arc::new(e)))))?;
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Find a certificate rejection anywhere in an error's source chain.
///
/// `io::Error` hides its payload from `source()`, and reqwest nests the
/// rustls error inside more than one of them, so every `io::Error` payload
/// is searched as well.
pub fn trust_error_in(error: &(dyn StdError + 'static)) -> Option<TrustError> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(found) = err.downcast_ref::<TlsError>().and_then(trust_error_from_tls) {
            return Some(found);
        }
        if let Some(inner) = err.downcast_ref::<std::io::Error>().and_then(|io| io.get_ref()) {
            if let Some(found) = trust_error_in(inner) {
                return Some(found);
            }
        }
        current = err.source();
    }
    None
}

fn trust_error_from_tls(error: &TlsError) -> Option<TrustError> {
    match error {
        TlsError::InvalidCertificate(CertificateError::Other(other)) => Some(
            other
                .0
                .downcast_ref::<TrustError>()
                .cloned()
                .unwrap_or_else(|| TrustError::Rejected(other.to_string())),
        ),
        TlsError::InvalidCertificate(reason) => Some(TrustError::Rejected(format!("{reason:?}"))),
        _ => None,
    }
}
