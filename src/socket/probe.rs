//! Standalone TLS handshake used to fetch the peer's leaf certificate.
//!
//! The probe resolves the host, connects to the first reachable address,
//! completes a client handshake with SNI, copies out the leaf certificate
//! and its SubjectPublicKeyInfo, then closes the session. No application
//! data is sent. The socket and TLS session are owned by the call and
//! dropped on every exit path.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::socket::tls::TlsConfig;
use crate::tls::verifier::PeerCertificateMaterial;
use boring::ssl::HandshakeError;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Blocking DNS -> TCP -> TLS probe.
#[derive(Debug, Clone, Default)]
pub struct HandshakeProbe {
    tls: TlsConfig,
    timeout: Option<Duration>,
}

impl HandshakeProbe {
    pub fn new(tls: TlsConfig) -> Self {
        Self { tls, timeout: None }
    }

    /// Bound each network step (connect per address, handshake reads and
    /// writes). `None` or a zero duration leaves the OS defaults in place.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// Fetch the leaf certificate material presented by `host:port`.
    pub fn probe(&self, host: &str, port: u16) -> Result<PeerCertificateMaterial, NetError> {
        let addrs = resolve(host, port)?;
        let stream = self.connect(host, port, &addrs)?;

        stream
            .set_read_timeout(self.timeout)
            .connection_context(host, port)?;
        stream
            .set_write_timeout(self.timeout)
            .connection_context(host, port)?;

        let connector = self.tls.connector(None)?;
        let config = self.tls.configure(&connector, host)?;

        tracing::debug!(host = %host, port, "starting probe handshake");
        let mut tls_stream = match config.connect(host, stream) {
            Ok(tls_stream) => tls_stream,
            Err(HandshakeError::Failure(mid)) => {
                // Socket-level failures (reset, read timeout) keep their IO kind.
                return match mid.into_error().into_io_error() {
                    Ok(io) => Err(io).handshake_context(host),
                    Err(ssl) => Err(NetError::handshake_failed(host, ssl)),
                };
            }
            Err(HandshakeError::WouldBlock(_)) => return Err(NetError::ConnectionTimedOut),
            Err(HandshakeError::SetupFailure(stack)) => {
                return Err(NetError::handshake_failed(host, stack))
            }
        };

        let material = match tls_stream.ssl().peer_certificate() {
            Some(cert) => PeerCertificateMaterial::from_x509(&cert),
            None => Err(NetError::SslNoPeerCertificate),
        };

        // close_notify is best effort; the socket closes on drop either way.
        let _ = tls_stream.shutdown();

        let material = material?;
        tracing::debug!(
            host = %host,
            port,
            cert_len = material.certificate_der.len(),
            spki_len = material.public_key_der.len(),
            "probe handshake complete"
        );
        Ok(material)
    }

    fn connect(&self, host: &str, port: u16, addrs: &[SocketAddr]) -> Result<TcpStream, NetError> {
        let mut last_err = NetError::ConnectionFailed;
        for addr in addrs {
            let attempt = match self.timeout {
                Some(timeout) => TcpStream::connect_timeout(addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt.connection_context(host, port) {
                Ok(stream) => {
                    tracing::debug!(host = %host, addr = %addr, "probe connected");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(host = %host, addr = %addr, error = %e, "probe connect attempt failed");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

/// Resolve `host:port` in resolver order.
fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, NetError> {
    tracing::debug!(host = %host, "resolving via getaddrinfo");
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().dns_context(host)?.collect();
    if addrs.is_empty() {
        return Err(NetError::dns_failed(
            host,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No addresses returned by getaddrinfo",
            ),
        ));
    }
    tracing::debug!(domain = %host, count = addrs.len(), "DNS resolution complete");
    Ok(addrs)
}
