use crate::base::neterror::NetError;
use crate::tls::verifier::{PeerCertificateMaterial, VerificationHook};
use boring::ssl::{
    ConnectConfiguration, SslConnector, SslConnectorBuilder, SslMethod, SslVerifyMode, SslVersion,
};
use boring::x509::store::{X509Store, X509StoreBuilder};
use boring::x509::X509;
use std::path::{Path, PathBuf};

/// BoringSSL client configuration shared by the preflight probe and the
/// bundled HTTP engine.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
    /// Standard CA chain and hostname verification.
    pub verify_peer: bool,
    /// CA bundle replacing the system trust store entirely.
    pub ca_file: Option<PathBuf>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::probe()
    }
}

impl TlsConfig {
    /// Configuration for a bare handshake: no ALPN, full verification.
    pub fn probe() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            alpn_protos: Vec::new(),
            verify_peer: true,
            ca_file: None,
        }
    }

    /// Configuration for HTTP/1.1 transfers.
    pub fn http1() -> Self {
        Self {
            alpn_protos: vec!["http/1.1".to_string()],
            ..Self::probe()
        }
    }

    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        self
    }

    pub fn ca_file(mut self, path: Option<PathBuf>) -> Self {
        self.ca_file = path;
        self
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.len() > 255 {
                    return Err(NetError::SslProtocolError);
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder
                .set_alpn_protos(&alpn_wire)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if let Some(path) = &self.ca_file {
            // The connector starts with the system roots loaded; swap the
            // whole store so only the bundle's certificates are trusted.
            builder.set_cert_store(Self::load_ca_store(path)?);
        }

        if self.verify_peer {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(())
    }

    /// Trust store holding exactly the certificates in the PEM bundle at
    /// `path`.
    pub fn load_ca_store(path: &Path) -> Result<X509Store, NetError> {
        let invalid = || NetError::InvalidCaBundle {
            path: path.display().to_string(),
        };
        let pem = std::fs::read(path).map_err(|_| invalid())?;
        let certs = X509::stack_from_pem(&pem).map_err(|_| invalid())?;
        if certs.is_empty() {
            return Err(invalid());
        }

        let mut store = X509StoreBuilder::new().map_err(|_| invalid())?;
        for cert in certs {
            store.add_cert(cert).map_err(|_| invalid())?;
        }
        tracing::debug!(path = %path.display(), "loaded CA bundle");
        Ok(store.build())
    }

    /// Build a connector, optionally with a verification hook bound into it.
    ///
    /// The hook is captured by the connector's own verify callback, so each
    /// connector carries its own pin context. It sees only the leaf
    /// certificate; returning `false` aborts the handshake.
    pub fn connector(&self, hook: Option<VerificationHook>) -> Result<SslConnector, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::CapabilityUnavailable)?;
        self.apply_to_builder(&mut builder)?;

        if let Some(hook) = hook {
            let verify_peer = self.verify_peer;
            builder.set_verify_callback(SslVerifyMode::PEER, move |preverified, ctx| {
                if !preverified && verify_peer {
                    return false;
                }
                if ctx.error_depth() != 0 {
                    return true;
                }
                let Some(leaf) = ctx.current_cert() else {
                    return false;
                };
                match PeerCertificateMaterial::from_x509(leaf) {
                    Ok(material) => {
                        let accepted = hook(&material);
                        if !accepted {
                            tracing::warn!("verification hook rejected peer certificate");
                        }
                        accepted
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "could not extract peer certificate");
                        false
                    }
                }
            });
        }

        Ok(builder.build())
    }

    /// Per-connection configuration: SNI and hostname checks for `host`.
    pub fn configure(
        &self,
        connector: &SslConnector,
        host: &str,
    ) -> Result<ConnectConfiguration, NetError> {
        let mut config = connector
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(Self::should_set_sni(host));
        config.set_verify_hostname(self.verify_peer);
        Ok(config)
    }

    /// Check if SNI should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sni_not_for_ip_literals() {
        assert!(TlsConfig::should_set_sni("example.org"));
        assert!(!TlsConfig::should_set_sni("127.0.0.1"));
        assert!(!TlsConfig::should_set_sni("::1"));
    }

    #[test]
    fn test_http1_alpn() {
        assert_eq!(TlsConfig::http1().alpn_protos, vec!["http/1.1"]);
        assert!(TlsConfig::probe().alpn_protos.is_empty());
    }

    #[test]
    fn test_connector_builds() {
        let config = TlsConfig::probe().verify_peer(false);
        assert!(config.connector(None).is_ok());
        let hook: VerificationHook = std::sync::Arc::new(|_| true);
        assert!(config.connector(Some(hook)).is_ok());
    }

    #[test]
    fn test_missing_ca_bundle_rejected() {
        let config = TlsConfig::probe().ca_file(Some(PathBuf::from("/nonexistent/ca.pem")));
        assert!(matches!(
            config.connector(None),
            Err(NetError::InvalidCaBundle { .. })
        ));
    }

    #[test]
    fn test_ca_bundle_without_certificates_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a certificate\n").unwrap();
        assert!(matches!(
            TlsConfig::load_ca_store(file.path()),
            Err(NetError::InvalidCaBundle { .. })
        ));

        let config = TlsConfig::probe().ca_file(Some(file.path().to_path_buf()));
        assert!(matches!(
            config.connector(None),
            Err(NetError::InvalidCaBundle { .. })
        ));
    }

    #[test]
    fn test_oversized_alpn_rejected() {
        let mut config = TlsConfig::http1();
        config.alpn_protos = vec!["x".repeat(300)];
        assert!(matches!(
            config.connector(None),
            Err(NetError::SslProtocolError)
        ));
    }
}
