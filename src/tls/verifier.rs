//! Pin verification against a peer's leaf certificate.

use crate::base::neterror::NetError;
use crate::tls::digest::digest;
use crate::tls::pinning::{PinKind, PinSet};
use boring::x509::X509Ref;
use std::sync::Arc;

/// A check run inside a live TLS handshake against the peer's leaf
/// certificate. Returning `false` rejects the handshake.
pub type VerificationHook = Arc<dyn Fn(&PeerCertificateMaterial) -> bool + Send + Sync>;

/// Bind `pins` into a hook. Each hook owns its pin set, so concurrent
/// requests never observe each other's pins.
pub fn pin_hook(pins: PinSet) -> VerificationHook {
    let pins = Arc::new(pins);
    Arc::new(move |material| verify(material, &pins).passed)
}

/// The leaf certificate material extracted from one TLS session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificateMaterial {
    /// DER-encoded leaf certificate.
    pub certificate_der: Vec<u8>,
    /// DER-encoded SubjectPublicKeyInfo of the leaf certificate.
    pub public_key_der: Vec<u8>,
}

impl PeerCertificateMaterial {
    pub fn new(certificate_der: Vec<u8>, public_key_der: Vec<u8>) -> Self {
        Self {
            certificate_der,
            public_key_der,
        }
    }

    /// Extract both encodings from a parsed certificate.
    pub fn from_x509(cert: &X509Ref) -> Result<Self, NetError> {
        let certificate_der = cert.to_der().map_err(|_| NetError::SslServerCertBadFormat)?;
        let public_key_der = cert
            .public_key()
            .and_then(|key| key.public_key_to_der())
            .map_err(|_| NetError::SslServerCertBadFormat)?;

        if certificate_der.is_empty() || public_key_der.is_empty() {
            return Err(NetError::SslServerCertBadFormat);
        }

        Ok(Self::new(certificate_der, public_key_der))
    }

    /// Base64 SHA-256 of the certificate.
    pub fn certificate_digest(&self) -> String {
        digest(&self.certificate_der)
    }

    /// Base64 SHA-256 of the SubjectPublicKeyInfo.
    pub fn spki_digest(&self) -> String {
        digest(&self.public_key_der)
    }
}

/// Terminal result of one verification pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub reason: Option<String>,
}

impl VerificationOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }

    /// Convert into a `Result`, mapping a failure to the error the request
    /// envelope should carry.
    pub fn into_result(self) -> Result<(), NetError> {
        if self.passed {
            Ok(())
        } else {
            Err(NetError::SslPinnedKeyNotInCertChain)
        }
    }
}

/// Check `material` against `pins`.
///
/// The certificate subset is tried first; the SPKI subset only if no
/// certificate pin matched. An empty pin set never passes.
pub fn verify(material: &PeerCertificateMaterial, pins: &PinSet) -> VerificationOutcome {
    if pins.is_empty() {
        return VerificationOutcome::fail("no pins configured");
    }

    if pins.has_kind(PinKind::Certificate) {
        let cert_digest = material.certificate_digest();
        tracing::debug!(digest = %cert_digest, "peer certificate digest");
        if pins.matches(PinKind::Certificate, &cert_digest) {
            tracing::debug!("certificate pin matched");
            return VerificationOutcome::pass();
        }
    }

    if pins.has_kind(PinKind::Spki) {
        let spki_digest = material.spki_digest();
        tracing::debug!(digest = %spki_digest, "peer SPKI digest");
        if pins.matches(PinKind::Spki, &spki_digest) {
            tracing::debug!("SPKI pin matched");
            return VerificationOutcome::pass();
        }
    }

    tracing::warn!(pins = pins.len(), "no configured pin matched peer certificate");
    VerificationOutcome::fail(NetError::SslPinnedKeyNotInCertChain.to_string())
}
