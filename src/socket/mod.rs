//! Sockets and TLS sessions.
//!
//! - [`probe`]: one-shot handshake that captures the peer's certificate
//! - [`tls`]: TLS configuration with BoringSSL
//! - [`client`]: plain or TLS stream used by the bundled engine

pub mod client;
pub mod probe;
pub mod tls;
