//! Selection of the preflight verification backend.
//!
//! The native backend drives its own handshake through BoringSSL. When the
//! native stack cannot be initialised, verification is delegated to a
//! platform verifier supplied by the embedding application. With neither
//! available every preflight check fails closed. The choice is made once,
//! when the client is built.

use crate::base::neterror::NetError;
use crate::socket::probe::HandshakeProbe;
use crate::socket::tls::TlsConfig;
use crate::tls::pinning::{PinKind, PinSet};
use crate::tls::verifier::verify;
use boring::ssl::{SslConnector, SslMethod};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Host-platform pin check, backed by the platform's own TLS stack.
///
/// Receives the pins as CSVs of bare base64 digests; either list may be
/// absent. Returns `true` only if a pin matched.
pub trait PlatformVerifier: Send + Sync {
    fn verify_host_pins(
        &self,
        host: &str,
        port: u16,
        spki_csv: Option<&str>,
        cert_csv: Option<&str>,
    ) -> bool;
}

impl<F> PlatformVerifier for F
where
    F: Fn(&str, u16, Option<&str>, Option<&str>) -> bool + Send + Sync,
{
    fn verify_host_pins(
        &self,
        host: &str,
        port: u16,
        spki_csv: Option<&str>,
        cert_csv: Option<&str>,
    ) -> bool {
        self(host, port, spki_csv, cert_csv)
    }
}

/// Everything a backend needs to check one host.
#[derive(Debug, Clone, Copy)]
pub struct PreflightTarget<'a> {
    pub host: &'a str,
    pub port: u16,
    pub pins: &'a PinSet,
    pub tls: &'a TlsConfig,
    pub timeout: Option<Duration>,
}

/// The backend chosen for preflight verification.
#[derive(Clone)]
pub enum PinningCapability {
    /// BoringSSL probe, with an optional platform verifier for probes that
    /// could not complete.
    Native {
        fallback: Option<Arc<dyn PlatformVerifier>>,
    },
    /// Native stack unavailable; the platform verifier decides.
    Platform(Arc<dyn PlatformVerifier>),
    /// Nothing can verify pins. Every check fails.
    Unavailable,
}

impl fmt::Debug for PinningCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinningCapability::Native { fallback } => f
                .debug_struct("Native")
                .field("fallback", &fallback.is_some())
                .finish(),
            PinningCapability::Platform(_) => f.write_str("Platform"),
            PinningCapability::Unavailable => f.write_str("Unavailable"),
        }
    }
}

impl PinningCapability {
    /// Pick a backend. `native_enabled = false` skips the native probe.
    pub fn detect(native_enabled: bool, platform: Option<Arc<dyn PlatformVerifier>>) -> Self {
        if native_enabled && native_tls_available() {
            tracing::debug!(fallback = platform.is_some(), "native pinning capability selected");
            return PinningCapability::Native { fallback: platform };
        }
        match platform {
            Some(platform) => {
                tracing::warn!("native TLS unavailable, using platform verifier");
                PinningCapability::Platform(platform)
            }
            None => {
                tracing::warn!("no pinning capability available, pinned requests will fail");
                PinningCapability::Unavailable
            }
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, PinningCapability::Native { .. })
    }

    /// Verify the pins of `target`.
    ///
    /// `Ok(())` means a pin matched. `Err(SslPinnedKeyNotInCertChain)` means
    /// digests were obtained and none matched; any other error means the
    /// check could not be completed.
    pub fn verify_host(&self, target: &PreflightTarget<'_>) -> Result<(), NetError> {
        match self {
            PinningCapability::Native { fallback } => match native_verify(target) {
                Err(e) if e.allows_fallback() => match fallback {
                    Some(platform) => {
                        tracing::warn!(
                            host = %target.host,
                            error = %e,
                            "native probe incomplete, falling back to platform verifier"
                        );
                        platform_verify(platform.as_ref(), target)
                    }
                    None => Err(e),
                },
                other => other,
            },
            PinningCapability::Platform(platform) => platform_verify(platform.as_ref(), target),
            PinningCapability::Unavailable => Err(NetError::CapabilityUnavailable),
        }
    }
}

/// Whether BoringSSL can build a client context in this process.
pub fn native_tls_available() -> bool {
    SslConnector::builder(SslMethod::tls()).is_ok()
}

fn native_verify(target: &PreflightTarget<'_>) -> Result<(), NetError> {
    let material = HandshakeProbe::new(target.tls.clone())
        .timeout(target.timeout)
        .probe(target.host, target.port)?;
    verify(&material, target.pins).into_result()
}

fn platform_verify(
    platform: &dyn PlatformVerifier,
    target: &PreflightTarget<'_>,
) -> Result<(), NetError> {
    let spki = target.pins.to_csv(PinKind::Spki);
    let cert = target.pins.to_csv(PinKind::Certificate);
    let passed =
        platform.verify_host_pins(target.host, target.port, spki.as_deref(), cert.as_deref());
    tracing::debug!(host = %target.host, port = target.port, passed, "platform verifier result");
    if passed {
        Ok(())
    } else {
        Err(NetError::SslPinnedKeyNotInCertChain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn target<'a>(pins: &'a PinSet, tls: &'a TlsConfig) -> PreflightTarget<'a> {
        PreflightTarget {
            host: "nonexistent.invalid",
            port: 443,
            pins,
            tls,
            timeout: Some(Duration::from_secs(2)),
        }
    }

    #[test]
    fn test_detect_native() {
        let cap = PinningCapability::detect(true, None);
        assert!(cap.is_native());
    }

    #[test]
    fn test_detect_disabled_without_platform_is_unavailable() {
        let cap = PinningCapability::detect(false, None);
        assert!(matches!(cap, PinningCapability::Unavailable));

        let pins = PinSet::from_csv(Some("x"), None);
        let tls = TlsConfig::probe();
        assert!(matches!(
            cap.verify_host(&target(&pins, &tls)),
            Err(NetError::CapabilityUnavailable)
        ));
    }

    #[test]
    fn test_platform_receives_csvs() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let platform: Arc<dyn PlatformVerifier> = Arc::new(
            move |host: &str, port: u16, spki: Option<&str>, cert: Option<&str>| {
                *seen_clone.lock().unwrap() = Some((
                    host.to_string(),
                    port,
                    spki.map(str::to_string),
                    cert.map(str::to_string),
                ));
                true
            },
        );
        let cap = PinningCapability::detect(false, Some(platform));
        assert!(matches!(cap, PinningCapability::Platform(_)));

        let pins = PinSet::from_csv(Some("sha256/a, b"), None);
        let tls = TlsConfig::probe();
        assert!(cap.verify_host(&target(&pins, &tls)).is_ok());

        let (host, port, spki, cert) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(host, "nonexistent.invalid");
        assert_eq!(port, 443);
        assert_eq!(spki.as_deref(), Some("a,b"));
        assert!(cert.is_none());
    }

    #[test]
    fn test_platform_false_is_mismatch() {
        let platform: Arc<dyn PlatformVerifier> =
            Arc::new(|_: &str, _: u16, _: Option<&str>, _: Option<&str>| false);
        let cap = PinningCapability::Platform(platform);
        let pins = PinSet::from_csv(Some("x"), None);
        let tls = TlsConfig::probe();
        assert!(matches!(
            cap.verify_host(&target(&pins, &tls)),
            Err(NetError::SslPinnedKeyNotInCertChain)
        ));
    }

    #[test]
    fn test_native_probe_failure_uses_fallback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let platform: Arc<dyn PlatformVerifier> =
            Arc::new(move |_: &str, _: u16, _: Option<&str>, _: Option<&str>| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                true
            });
        let cap = PinningCapability::Native {
            fallback: Some(platform),
        };
        let pins = PinSet::from_csv(Some("x"), None);
        let tls = TlsConfig::probe();
        assert!(cap.verify_host(&target(&pins, &tls)).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_native_probe_failure_without_fallback_fails_closed() {
        let cap = PinningCapability::Native { fallback: None };
        let pins = PinSet::from_csv(Some("x"), None);
        let tls = TlsConfig::probe();
        let err = cap.verify_host(&target(&pins, &tls)).unwrap_err();
        assert!(err.allows_fallback());
    }
}
