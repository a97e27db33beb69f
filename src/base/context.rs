//! Maps `io::Error`s from the probe and the engine onto `NetError`,
//! attaching the host (and port) the failing step was talking to.

use crate::base::neterror::NetError;
use std::io;

/// Attach endpoint context to a failed IO step.
pub trait IoResultExt<T> {
    /// TCP connect to `host:port`. A timed-out connect becomes
    /// `ConnectionTimedOut`.
    ///
    /// ```ignore
    /// use pinnet::base::context::IoResultExt;
    ///
    /// let sock = TcpStream::connect_timeout(&addr, limit).connection_context(host, 443)?;
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Name lookup for `domain`.
    fn dns_context(self, domain: &str) -> Result<T, NetError>;

    /// Socket failure while handshaking with `host`. Read timeouts on a
    /// blocking socket surface as `WouldBlock` and become
    /// `ConnectionTimedOut`.
    fn handshake_context(self, host: &str) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| NetError::connection_failed_to(host, port, e))
    }

    fn dns_context(self, domain: &str) -> Result<T, NetError> {
        self.map_err(|e| NetError::dns_failed(domain, e))
    }

    fn handshake_context(self, host: &str) -> Result<T, NetError> {
        self.map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => NetError::ConnectionTimedOut,
            _ => NetError::handshake_failed(host, e),
        })
    }
}
